//! `net-mapper`: parse one device dump with a profile and export the drawing.
//!
//! Configured from the environment (a `.env` file is honoured):
//! - `NET_MAPPER_INPUT`        dump to read (required)
//! - `NET_MAPPER_PROFILE`      built-in profile name, default `omci`
//! - `NET_MAPPER_PROFILE_FILE` profile YAML, overrides `NET_MAPPER_PROFILE`
//! - `NET_MAPPER_VIEW`         `"Type key"` anchor to draw a subtree
//! - `NET_MAPPER_LINK_VIEW`    link view name
//! - `NET_MAPPER_OUT`          output root, default `./graphs_data`
//!
//! Artifacts land in `<out>/<timestamp>/`.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use netgraph::core::summary::DrawSummary;
use netgraph::export::save_all::{self, PersistSummary};
use netgraph::graph::ViewAnchor;
use netgraph::{Profile, telemetry};
use tracing::{Level, info, warn};

#[derive(Debug)]
struct Settings {
    input: PathBuf,
    profile: String,
    profile_file: Option<PathBuf>,
    view: Option<String>,
    link_view: Option<String>,
    out_root: PathBuf,
}

impl Settings {
    fn from_env() -> Result<Self> {
        let input = env::var("NET_MAPPER_INPUT").map_err(|_| anyhow!("NET_MAPPER_INPUT is not set"))?;
        Ok(Self {
            input: PathBuf::from(input),
            profile: env::var("NET_MAPPER_PROFILE").unwrap_or_else(|_| "omci".to_string()),
            profile_file: env::var("NET_MAPPER_PROFILE_FILE").ok().map(PathBuf::from),
            view: env::var("NET_MAPPER_VIEW").ok().filter(|v| !v.trim().is_empty()),
            link_view: env::var("NET_MAPPER_LINK_VIEW").ok().filter(|v| !v.trim().is_empty()),
            out_root: env::var("NET_MAPPER_OUT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("graphs_data")),
        })
    }

    fn load_profile(&self) -> Result<Profile> {
        match &self.profile_file {
            Some(path) => device_profiles::from_path(path),
            None => device_profiles::builtin(&self.profile),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; settings may come from the real environment.
    dotenvy::dotenv().ok();

    telemetry::init("info", Level::INFO)?;

    let settings = Settings::from_env()?;
    let persisted = run(&settings).await?;
    info!(
        out_dir = %persisted.out_dir,
        nodes = persisted.rendered_nodes_by_type.values().sum::<usize>(),
        edges = persisted.rendered_edges_by_kind.values().sum::<usize>(),
        "drawing exported"
    );
    Ok(())
}

#[tracing::instrument(level = "info", skip_all, fields(input = %settings.input.display()))]
async fn run(settings: &Settings) -> Result<PersistSummary> {
    let profile = settings.load_profile()?;

    let raw = tokio::fs::read_to_string(&settings.input)
        .await
        .with_context(|| format!("failed to read {}", settings.input.display()))?;
    let diagram = profile.parse(&raw)?;
    let built = diagram.summary();
    info!(
        nodes = built.counts.nodes,
        links = built.counts.links,
        total_ms = built.timings_ms.total as u64,
        "diagram built"
    );

    let link_view = settings.link_view.as_deref();
    let (render, drawn) = match settings.view.as_deref() {
        Some(view) => {
            let anchor: ViewAnchor = view.parse().map_err(|e: String| anyhow!(e))?;
            let known = diagram.views(&profile.display);
            if !known.contains(&anchor) {
                warn!(%anchor, available = known.len(), "view is not one of the profile's anchors");
            }
            DrawSummary::measure(|| diagram.draw_view(&profile.display, &anchor, link_view))
        }
        None => DrawSummary::measure(|| diagram.draw_link_view(&profile.display, link_view)),
    };
    info!(nodes = drawn.nodes, edges = drawn.edges, elapsed_ms = drawn.elapsed_ms as u64, "drawn");

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    save_all::persist_all(&settings.out_root.join(timestamp), &render, &built)
}
