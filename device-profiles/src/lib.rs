//! Built-in device profiles for `netgraph`.
//!
//! Each profile pairs a YAML definition (schema, styles, views) with the
//! Rust strategies and hooks it names:
//! - `omci`  : G.988 OMCI MIB dumps (XML)
//! - `rdp`   : RDP network-processor dumps (JSON)
//! - `model1`: BBF forwarder/interface configuration (XML)

pub mod model1;
pub mod omci;
pub mod rdp;

use std::path::Path;

use anyhow::{Context, Result, bail};
use netgraph::config::{load_profile_from_path, load_profile_from_str};
use netgraph::{Profile, Registry};
use tracing::info;

pub const PROFILE_NAMES: [&str; 3] = ["omci", "rdp", "model1"];

const OMCI_YAML: &str = include_str!("../profiles/omci.yaml");
const RDP_YAML: &str = include_str!("../profiles/rdp.yaml");
const MODEL1_YAML: &str = include_str!("../profiles/model1.yaml");

/// Generic strategies plus every device-specific one.
pub fn registry() -> Registry {
    let mut registry = Registry::with_builtins();
    omci::register(&mut registry);
    rdp::register(&mut registry);
    model1::register(&mut registry);
    registry
}

/// YAML source of a built-in profile.
pub fn builtin_yaml(name: &str) -> Option<&'static str> {
    match name {
        "omci" => Some(OMCI_YAML),
        "rdp" => Some(RDP_YAML),
        "model1" => Some(MODEL1_YAML),
        _ => None,
    }
}

/// Compile a built-in profile by name.
pub fn builtin(name: &str) -> Result<Profile> {
    let Some(yaml) = builtin_yaml(name) else {
        bail!("unknown profile `{name}` (expected one of {})", PROFILE_NAMES.join(", "));
    };
    from_yaml(yaml).with_context(|| format!("built-in profile `{name}`"))
}

/// Compile a profile definition given as YAML text.
pub fn from_yaml(yaml: &str) -> Result<Profile> {
    let def = load_profile_from_str(yaml).context("invalid profile definition")?;
    let profile = Profile::compile(&def, &registry()).context("profile does not compile")?;
    info!(profile = %profile.name, "profile ready");
    Ok(profile)
}

/// Compile a profile definition file.
pub fn from_path(path: &Path) -> Result<Profile> {
    let def = load_profile_from_path(path)
        .with_context(|| format!("failed to load profile from {}", path.display()))?;
    Profile::compile(&def, &registry()).with_context(|| format!("profile {} does not compile", path.display()))
}
