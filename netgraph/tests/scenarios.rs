//! End-to-end parses through the public API.

use netgraph::config::load_profile_from_str;
use netgraph::document::DocumentFormat;
use netgraph::graph::{AvoidLinks, ViewAnchor};
use netgraph::model::{LinkKind, NodeKey};
use netgraph::schema::{EntityRule, KeyParse, KeySource, PointerSpec, TargetHook, TransformHook};
use netgraph::{GraphBuilder, Profile, Registry, SchemaTable};
use pretty_assertions::assert_eq;

fn a_to_b() -> SchemaTable {
    SchemaTable::new(DocumentFormat::Xml)
        .with_key(KeySource::Field("id".into()))
        .with_entity(
            "A",
            EntityRule::new().with_link(PointerSpec::field("ref", "B").with_to("id")),
        )
        .with_entity("B", EntityRule::new())
}

#[test]
fn matching_reference_creates_one_link() {
    let d = GraphBuilder::new(a_to_b())
        .parse("<r><A><id>1</id><ref>5</ref></A><B><id>5</id></B></r>")
        .expect("parses");
    assert_eq!(d.node_count(), 2);
    assert_eq!(d.link_count(), 1);

    let g = d.draw_subtree("A", "1", &[], &AvoidLinks::new());
    assert_eq!(g.nodes.len(), 2);
    assert_eq!(g.edges.len(), 1);
    assert_eq!(g.edges[0].from, d.nodes()[0].id());
    assert_eq!(g.edges[0].to, d.nodes()[1].id());
}

#[test]
fn non_matching_reference_creates_no_link() {
    let d = GraphBuilder::new(a_to_b())
        .parse("<r><A><id>1</id><ref>5</ref></A><B><id>6</id></B></r>")
        .expect("parses");
    assert_eq!(d.node_count(), 2);
    assert_eq!(d.link_count(), 0);
    assert_eq!(d.draw_subtree("A", "1", &[], &AvoidLinks::new()).nodes.len(), 1);
}

#[test]
fn missing_key_drops_node_and_nested_children() {
    let schema = SchemaTable::new(DocumentFormat::Xml)
        .with_key(KeySource::Field("id".into()))
        .with_entity(
            "shelf",
            EntityRule::new().with_child(
                "slot",
                EntityRule::new()
                    .with_key(KeySource::Field("index".into()))
                    .with_child("card", EntityRule::new().with_key(KeySource::Field("serial".into()))),
            ),
        );
    let raw = r#"<chassis>
        <shelf><id>1</id>
            <slot><card><serial>X1</serial></card></slot>
            <slot><index>2</index><card><serial>X2</serial></card></slot>
        </shelf>
    </chassis>"#;
    let d = GraphBuilder::new(schema).parse(raw).expect("parses");

    let keys: Vec<(&str, String)> = d
        .nodes()
        .iter()
        .map(|n| (n.type_name(), n.key().to_string()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("shelf", "1".to_string()),
            ("slot", "2".to_string()),
            ("card", "X2".to_string()),
        ]
    );
    // card → slot → shelf ownership chain.
    assert_eq!(d.link_count(), 2);
    assert!(d.links().iter().all(|l| l.kind() == LinkKind::Parent));
    assert_eq!(d.links()[0].from_label(), "parent");
    assert_eq!(d.node(d.links()[0].from()).map(|n| n.type_name()), Some("slot"));
}

#[test]
fn full_draw_matches_the_arenas() {
    let d = GraphBuilder::new(a_to_b())
        .parse("<r><A><id>1</id><ref>5</ref><ref>5</ref></A><B><id>5</id></B><B><id>7</id></B></r>")
        .expect("parses");
    let g = d.draw(&[]);
    assert_eq!(g.nodes.len(), d.node_count());
    assert_eq!(g.edges.len(), d.link_count());
    assert_eq!(d.link_count(), 2);
}

#[test]
fn integer_keys_and_describe_are_stable() {
    let schema = a_to_b().with_key_parse(KeyParse::Integer);
    let d = GraphBuilder::new(schema)
        .parse("<r><B><id> 0005 </id><Mask>12</Mask></B></r>")
        .expect("parses");
    let node = &d.nodes()[0];
    assert_eq!(node.key(), &NodeKey::Int(5));

    let first = d.describe(node.id()).expect("present");
    let again = d.describe(node.id()).expect("present");
    assert_eq!(first, again);
    assert_eq!(first.title, "B 5");
    let mask = &first.children[1];
    assert_eq!(mask.label, "Mask: 12");
    let breakdown: Vec<&str> = mask.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(breakdown, vec!["bin: 0b1100", "dec: 12", "hex: 0xc"]);
}

const RDP_LIKE: &str = r#"{
    "port": {
        "port/index=0": { "tm_cfg": { "egress_tm": "egress_tm/dir=us,index=1" }, },
        "port/index=1": { "tm_cfg": { "egress_tm": "egress_tm/dir=us,index=9" } },
    },
    "egress_tm": {
        "egress_tm/dir=us,index=1": {
            "mode": "sp",
            "queue_cfg": [ { "queue_id": 0 }, { "queue_id": 1, }, ],
        },
    },
    "ingress_class": {
        "ingress_class/dir=ds,index=0": {
            "flow": [
                { "key": { "ingress_port": 1 }, "result": { "egress_port": 0 } },
            ],
        },
    },
}"#;

const RDP_PROFILE: &str = r#"
name: rdp-like
schema:
  format: json
  key: element_name
  types:
    port:
      links:
        - { from: tm_cfg/egress_tm, target: egress_tm }
    egress_tm:
      children:
        queue_cfg: {}
    ingress_class:
      children:
        flow:
          links:
            - { from: key/ingress_port, target: port, transform: port_ref, kind: upstream }
            - { from: result/egress_port, target: port, transform: port_ref, kind: downstream }
display:
  link_views:
    all: [parent, reference, upstream, downstream, bidirectional]
    traffic: [upstream, downstream]
"#;

fn rdp_registry() -> Registry {
    let mut registry = Registry::with_builtins();
    registry.register_transform(TransformHook::new("port_ref", |raw| Some(format!("port/index={raw}"))));
    registry
}

#[test]
fn json_keyed_collections_trailing_commas_and_transforms() {
    let def = load_profile_from_str(RDP_PROFILE).expect("valid profile");
    let profile = Profile::compile(&def, &rdp_registry()).expect("compiles");
    let d = profile.parse(RDP_LIKE).expect("loose json parses");

    let names: Vec<String> = d.nodes().iter().map(|n| format!("{} {}", n.type_name(), n.key())).collect();
    assert_eq!(
        names,
        vec![
            "port port/index=0",
            "port port/index=1",
            "egress_tm egress_tm/dir=us,index=1",
            "queue_cfg 0",
            "queue_cfg 1",
            "ingress_class ingress_class/dir=ds,index=0",
            "flow 0",
        ]
    );

    let kinds: Vec<LinkKind> = d.links().iter().map(|l| l.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            LinkKind::Reference, // port 0 → egress_tm
            LinkKind::Parent,
            LinkKind::Parent,
            LinkKind::Parent,
            LinkKind::Upstream,
            LinkKind::Downstream,
        ]
    );

    let traffic = d.draw_link_view(&profile.display, Some("traffic"));
    assert_eq!(traffic.edges.len(), 2);
    assert_eq!(traffic.nodes.len(), d.node_count());
}

#[test]
fn field_maps_dispatch_on_an_enum_field() {
    let yaml = r#"
name: omci-like
schema:
  format: xml
  key: { field: ManagedEntityId }
  key_parse: integer
  types:
    MacBridgePortConfigData:
      links:
        - target_map:
            field: TpType
            map:
              "1": PptpEthernetUni
              "3": GemInterworkingTp|MulticastGemInterworkingTp
          from: TpPointer
          to: ManagedEntityId
          note: tp
    PptpEthernetUni: {}
    GemInterworkingTp: {}
    MulticastGemInterworkingTp: {}
    ExtendedVlanTaggingOperationConfigurationData:
      links:
        - target_fn: assoc_type
          from: AssociatedMePointer
          to: ManagedEntityId
display:
  anchors:
    MacBridgePortConfigData: {}
"#;
    let mut registry = Registry::with_builtins();
    registry.register_target(TargetHook::new("assoc_type", |el, _| {
        match el.field("AssociationType").as_deref() {
            Some("2") => Some("PptpEthernetUni".into()),
            _ => None,
        }
    }));
    let def = load_profile_from_str(yaml).expect("valid");
    let profile = Profile::compile(&def, &registry).expect("compiles");

    let raw = r#"<MIB>
        <MacBridgePortConfigData><ManagedEntityId>1</ManagedEntityId><TpType>1</TpType><TpPointer>257</TpPointer></MacBridgePortConfigData>
        <MacBridgePortConfigData><ManagedEntityId>2</ManagedEntityId><TpType>3</TpType><TpPointer>4</TpPointer></MacBridgePortConfigData>
        <MacBridgePortConfigData><ManagedEntityId>3</ManagedEntityId><TpType>9</TpType><TpPointer>4</TpPointer></MacBridgePortConfigData>
        <PptpEthernetUni><ManagedEntityId>257</ManagedEntityId></PptpEthernetUni>
        <MulticastGemInterworkingTp><ManagedEntityId>4</ManagedEntityId></MulticastGemInterworkingTp>
        <ExtendedVlanTaggingOperationConfigurationData>
            <ManagedEntityId>8</ManagedEntityId><AssociationType>2</AssociationType><AssociatedMePointer>257</AssociatedMePointer>
        </ExtendedVlanTaggingOperationConfigurationData>
    </MIB>"#;
    let d = profile.parse(raw).expect("parses");

    let edges: Vec<(String, String, Option<&str>)> = d
        .links()
        .iter()
        .map(|l| {
            let from = d.node(l.from()).expect("from");
            let to = d.node(l.to()).expect("to");
            (
                format!("{} {}", from.type_name(), from.key()),
                format!("{} {}", to.type_name(), to.key()),
                l.note(),
            )
        })
        .collect();
    assert_eq!(
        edges,
        vec![
            ("MacBridgePortConfigData 1".into(), "PptpEthernetUni 257".into(), Some("tp")),
            ("MacBridgePortConfigData 2".into(), "MulticastGemInterworkingTp 4".into(), Some("tp")),
            (
                "ExtendedVlanTaggingOperationConfigurationData 8".into(),
                "PptpEthernetUni 257".into(),
                None
            ),
        ]
    );

    let anchors: Vec<String> = d.views(&profile.display).iter().map(ToString::to_string).collect();
    assert_eq!(
        anchors,
        vec!["MacBridgePortConfigData 1", "MacBridgePortConfigData 2", "MacBridgePortConfigData 3"]
    );
    let anchor: ViewAnchor = "MacBridgePortConfigData 1".parse().expect("anchor");
    let g = d.draw_view(&profile.display, &anchor, None);
    let labels: Vec<&str> = g.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "MacBridgePortConfigData 1",
            "PptpEthernetUni 257",
            "ExtendedVlanTaggingOperationConfigurationData 8",
        ]
    );
}

#[test]
fn broken_documents_report_document_errors() {
    let builder = GraphBuilder::new(a_to_b());
    assert!(matches!(
        builder.parse("   "),
        Err(netgraph::NetGraphError::Document(_))
    ));
    let json = GraphBuilder::new(SchemaTable::new(DocumentFormat::Json).with_entity("x", EntityRule::new()));
    let err = json.parse("{\"x\": [1, 2}").expect_err("bad json");
    assert!(err.to_string().starts_with("[NetGraph]"));
}
