//! OMCI MIB dumps (ITU-T G.988 managed entities) as XML.
//!
//! Every managed entity is keyed by `ManagedEntityId`. Table attributes
//! carry `instance`/`nextInstance` markers; only the live instance row is
//! shown in the inspector.

pub mod decoders;

use std::sync::Arc;

use netgraph::Registry;
use netgraph::model::{
    AttrOverrides, AttributeRenderer, CurveKind, DecodedRenderer, DisplayNode, EdgeCurve, ElementView,
    FieldDecoder, FieldSource, HexStringRenderer, LinkStyle, LinkView, NodeClass, NodeView, PlainRenderer,
    RenderEdge, RenderNode, dump_nodes,
};
use netgraph::schema::{TargetHook, TargetTypes, ValueHook};

use self::decoders::{
    BytesPerSecond, ExtVlanDownstreamMode, ForwardOption, SerialNumber, VendorProductCode, VlanFilterList,
    VlanTaggingBehaviour,
};

pub const KEY_FIELD: &str = "ManagedEntityId";
pub const NODE_CLASS: &str = "omci";
pub const PBIT_LINK_STYLE: &str = "omci_pbit";

const MAPPER_TYPE: &str = "MapperServiceProfile";
const PBIT_POINTER: &str = "InterworkTpPointerPriority";

/// Register every OMCI strategy and hook.
pub fn register(registry: &mut Registry) {
    let plain = PlainRenderer::default();
    let decoded = |decoder: Arc<dyn FieldDecoder>| -> Arc<dyn AttributeRenderer> {
        Arc::new(InstanceGate::new(Arc::new(DecodedRenderer::new(decoder).with_base(plain))))
    };

    registry
        .register_node_class(NODE_CLASS, Arc::new(OmciNodeClass))
        .register_link_style(PBIT_LINK_STYLE, Arc::new(PbitCurve))
        .register_renderer("omci", Arc::new(InstanceGate::new(Arc::new(plain))))
        .register_renderer(
            "omci_hex_string",
            Arc::new(InstanceGate::new(Arc::new(HexStringRenderer { base: plain }))),
        )
        .register_renderer("omci_serial_number", decoded(Arc::new(SerialNumber)))
        .register_renderer("omci_vendor_product_code", decoded(Arc::new(VendorProductCode)))
        .register_renderer("omci_byte_per_sec", decoded(Arc::new(BytesPerSecond)))
        .register_renderer("omci_forward_option", decoded(Arc::new(ForwardOption)))
        .register_renderer("omci_vlan_filter_list", decoded(Arc::new(VlanFilterList)))
        .register_renderer("omci_ds_mode", decoded(Arc::new(ExtVlanDownstreamMode)))
        .register_renderer(
            "omci_vlan_tagging_table",
            Arc::new(TableRowRenderer::new(Arc::new(VlanTaggingBehaviour))),
        )
        .register_value(ValueHook::new("omci_circuit_pack_meid", circuit_pack_meid))
        .register_value(ValueHook::new("omci_related_port_meid", related_port_meid))
        .register_target(TargetHook::new("omci_related_port_type", related_port_type));
}

/* ------------------------------------------------------------------------- */
/* Nodes                                                                     */
/* ------------------------------------------------------------------------- */

/// Boxes with a G.988 reference card as hover text.
///
/// The card is read from the style entry's `details`: `name`, `class_id`,
/// `chapter` and `page`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmciNodeClass;

impl OmciNodeClass {
    fn reference_card(node: NodeView<'_>) -> Option<String> {
        let style = node.style()?;
        let name = style.detail("name")?;

        let mut lines = vec![name];
        if let Some(class_id) = style.detail("class_id") {
            lines.push(format!("MeClass: {class_id}"));
        }
        lines.push(format!("MeId: {}", node.key()));
        lines.push(String::new());
        if let Some(chapter) = style.detail("chapter") {
            lines.push(format!("Chapter: {chapter}"));
        }
        if let Some(page) = style.detail("page").filter(|p| p != "0") {
            lines.push(format!("Page: {page}"));
        }
        Some(lines.join("\n"))
    }
}

impl NodeClass for OmciNodeClass {
    fn defaults(&self, out: &mut RenderNode) {
        out.shape = Some("box".into());
        out.margin = Some(12);
        out.font_size = Some(24);
    }

    fn decorate(&self, node: NodeView<'_>, out: &mut RenderNode) {
        if let Some(card) = Self::reference_card(node) {
            out.title = Some(card);
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Attributes                                                                */
/* ------------------------------------------------------------------------- */

/// Whether a composite attribute is a stale or placeholder table row.
fn is_inactive_row(field: &FieldSource<'_>) -> bool {
    field.is_composite() && (field.prop("instance").is_none() || field.prop("nextInstance").is_some())
}

/// Hides inactive table rows, renders everything else with `inner`.
#[derive(Debug, Clone)]
pub struct InstanceGate {
    inner: Arc<dyn AttributeRenderer>,
}

impl InstanceGate {
    pub fn new(inner: Arc<dyn AttributeRenderer>) -> Self {
        Self { inner }
    }
}

impl AttributeRenderer for InstanceGate {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        if is_inactive_row(&field) {
            return None;
        }
        self.inner.render(field, nested)
    }
}

/// Table attribute whose first row is decoded in place.
#[derive(Debug, Clone)]
pub struct TableRowRenderer {
    decoder: Arc<dyn FieldDecoder>,
    base: PlainRenderer,
}

impl TableRowRenderer {
    pub fn new(decoder: Arc<dyn FieldDecoder>) -> Self {
        Self {
            decoder,
            base: PlainRenderer::default(),
        }
    }
}

impl AttributeRenderer for TableRowRenderer {
    fn render(&self, field: FieldSource<'_>, nested: Option<&AttrOverrides>) -> Option<DisplayNode> {
        if !field.is_composite() || is_inactive_row(&field) {
            return None;
        }
        let mut node = self.base.tree(field, nested);
        let decoded = field
            .children()
            .next()
            .and_then(|row| row.text())
            .and_then(|raw| self.decoder.decode(&raw));
        if let (Some(lines), Some(row)) = (decoded, node.children.first_mut()) {
            row.children = dump_nodes(lines);
            row.opened = Some(true);
        }
        Some(node)
    }
}

/* ------------------------------------------------------------------------- */
/* Links                                                                     */
/* ------------------------------------------------------------------------- */

/// Bends the eight p-bit links of an 802.1p mapper apart.
///
/// Lower p-bits curve clockwise, upper ones counter-clockwise, with
/// roundness shrinking towards the last p-bit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PbitCurve;

impl LinkStyle for PbitCurve {
    fn decorate(&self, view: LinkView<'_>, out: &mut RenderEdge) {
        if view.from.type_name() != MAPPER_TYPE {
            return;
        }
        let Some(pbit) = view
            .link
            .from_label()
            .strip_prefix(PBIT_POINTER)
            .and_then(|rest| rest.chars().next())
            .and_then(|c| c.to_digit(10))
        else {
            return;
        };

        let count = view.from.links().len() as f32;
        let pbit = pbit as f32;
        out.curve = Some(EdgeCurve {
            kind: if pbit < count / 2.0 {
                CurveKind::CurvedCw
            } else {
                CurveKind::CurvedCcw
            },
            roundness: (count - pbit) / 2.0 * 0.15,
        });
    }
}

/* ------------------------------------------------------------------------- */
/* Pointer hooks                                                             */
/* ------------------------------------------------------------------------- */

fn meid(element: &ElementView<'_>) -> Option<i64> {
    element.field(KEY_FIELD)?.trim().parse().ok()
}

/// A UNI's circuit pack: slot number in the high byte of the UNI's ME id.
fn circuit_pack_meid(element: ElementView<'_>, _from: Option<&str>) -> Option<String> {
    Some((0x0100 | (meid(&element)? >> 8)).to_string())
}

/// Downstream queues (ME id ≤ 0x7fff) hang off a UNI, upstream ones off a T-CONT.
fn related_port_type(element: ElementView<'_>, _from: Option<&str>) -> Option<TargetTypes> {
    match meid(&element)? {
        0..=0x7fff => Some("PptpEthernetUni|VirtualEthernetInterfacePoint".into()),
        0x8000..=0xffff => Some("TCont".into()),
        _ => None,
    }
}

/// The related port's ME id sits in the upper 16 bits of `RelatedPort`.
fn related_port_meid(element: ElementView<'_>, from: Option<&str>) -> Option<String> {
    if !(0..=0xffff).contains(&meid(&element)?) {
        return None;
    }
    let port: i64 = element.field(from?)?.trim().parse().ok()?;
    Some((port >> 16).to_string())
}
