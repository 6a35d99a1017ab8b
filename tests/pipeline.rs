//! End-to-end pipeline test against a small synthetic filing directory:
//! discover files, parse presentation/definition linkbases, classify usage
//! from the schema, attach labels, parse the inline-XBRL instance, and
//! resolve one fact.

use jpxbrl::prelude::*;

const XSD: &str = r#"<?xml version="1.0"?>
<schema xmlns="http://www.w3.org/2001/XMLSchema" xmlns:xbrli="http://www.xbrl.org/2003/instance">
    <annotation>
        <appinfo>
            <linkbaseRef xlink:href="co_lab.xml" xmlns:xlink="http://www.w3.org/1999/xlink"/>
        </appinfo>
    </annotation>
    <element id="Heading" name="BalanceSheetHeading" type="stringItemType" substitutionGroup="identifierItem" abstract="true"/>
    <element id="ConsolidatedOrNonConsolidatedAxis" name="ConsolidatedOrNonConsolidatedAxis" type="stringItemType" substitutionGroup="dimensionItem" abstract="true"/>
    <element id="ConsolidatedMember" name="ConsolidatedMember" type="domainItemType" substitutionGroup="item" abstract="true"/>
    <element id="NetAssets" name="NetAssets" type="monetaryItemType" substitutionGroup="item" abstract="false" periodType="instant"/>
</schema>"#;

const PRE_XML: &str = r#"<linkbase xmlns:xlink="http://www.w3.org/1999/xlink">
    <presentationLink xlink:role="http://example.com/role/BalanceSheet">
        <loc xlink:href="co.xsd#Heading" xlink:label="loc_heading"/>
        <loc xlink:href="co.xsd#ConsolidatedOrNonConsolidatedAxis" xlink:label="loc_axis"/>
        <loc xlink:href="co.xsd#ConsolidatedMember" xlink:label="loc_consolidated_member"/>
        <loc xlink:href="co.xsd#NetAssets" xlink:label="loc_net_assets"/>
        <presentationArc xlink:from="loc_heading" xlink:to="loc_axis" order="1"/>
        <presentationArc xlink:from="loc_axis" xlink:to="loc_consolidated_member" order="1"/>
        <presentationArc xlink:from="loc_heading" xlink:to="loc_net_assets" order="2"/>
    </presentationLink>
</linkbase>"#;

const DEF_XML: &str = r#"<linkbase xmlns:xlink="http://www.w3.org/1999/xlink">
    <definitionLink xlink:role="http://example.com/role/BalanceSheet">
        <loc xlink:href="co.xsd#ConsolidatedOrNonConsolidatedAxis" xlink:label="loc_axis"/>
        <loc xlink:href="co.xsd#ConsolidatedMember" xlink:label="loc_consolidated_member"/>
        <definitionArc xlink:from="loc_axis" xlink:to="loc_consolidated_member" order="1" arcrole="http://xbrl.org/int/dim/arcrole/dimension-default"/>
    </definitionLink>
</linkbase>"#;

const CAL_XML: &str = r#"<linkbase xmlns:xlink="http://www.w3.org/1999/xlink">
    <calculationLink xlink:role="http://example.com/role/BalanceSheet"></calculationLink>
</linkbase>"#;

const LAB_XML: &str = r#"<linkbase xmlns:xlink="http://www.w3.org/1999/xlink">
    <labelLink>
        <loc xlink:href="co.xsd#NetAssets" xlink:label="loc_lab_net_assets"/>
        <label xlink:label="label_net_assets" xlink:role="http://www.xbrl.org/2003/role/label">Net assets</label>
        <labelArc xlink:from="loc_lab_net_assets" xlink:to="label_net_assets"/>
    </labelLink>
</linkbase>"#;

const IXBRL: &str = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL" xmlns:xbrli="http://www.xbrl.org/2003/instance">
    <body>
        <xbrli:context id="CurrentYearInstant"></xbrli:context>
        <ix:nonFraction contextRef="CurrentYearInstant" name="NetAssets" scale="3" format="ixt:numdotdecimal">12,345</ix:nonFraction>
    </body>
</html>"#;

fn write_fixture(dir: &std::path::Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("co.xsd"), XSD).unwrap();
    std::fs::write(dir.join("co_pre.xml"), PRE_XML).unwrap();
    std::fs::write(dir.join("co_def.xml"), DEF_XML).unwrap();
    std::fs::write(dir.join("co_cal.xml"), CAL_XML).unwrap();
    std::fs::write(dir.join("co_lab.xml"), LAB_XML).unwrap();
    std::fs::write(dir.join("co-ixbrl.htm"), IXBRL).unwrap();
}

#[test]
fn test_full_pipeline_resolves_single_fact() {
    let dir = std::env::temp_dir().join(format!("jpxbrl_pipeline_test_{}", std::process::id()));
    write_fixture(&dir);

    let filing = FilingPaths::discover(&dir).unwrap();
    let xml_src = XmlSource::builder().webcache_dir(dir.join("webcache")).build();

    let mut pre_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Presentation).unwrap();
    let def_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Definition).unwrap();

    pre_tree.enrich_schema(&xml_src, "BalanceSheet").unwrap();
    pre_tree.enrich_labels(&xml_src, &filing, "BalanceSheet").unwrap();
    pre_tree.set_dimension_default(&def_tree, "BalanceSheet").unwrap();

    let instance = InstanceAnalyzer::load(&xml_src, &filing.instance_documents()).unwrap();

    let params = ResolveParams::builder()
        .role_id("BalanceSheet")
        .target_time("CurrentYear")
        .one_before("Prior1Year")
        .build();
    params.validate_all().unwrap();

    pre_tree.read_instance_data(&instance, &params).unwrap();

    let root = pre_tree.role_node_id("BalanceSheet").unwrap();
    let net_assets_id = pre_tree
        .walk(root)
        .find(|&n| pre_tree.node(n).id.as_deref() == Some("NetAssets"))
        .unwrap();
    let net_assets = pre_tree.node(net_assets_id);

    assert_eq!(net_assets.label.as_deref(), Some("Net assets"));
    assert_eq!(net_assets.usage, Some(Usage::Number));
    let fact = net_assets.fact.as_ref().expect("fact resolved");
    assert_eq!(fact.value.value_str(), "12345000");

    let consolidated_member_id = pre_tree
        .walk(root)
        .find(|&n| pre_tree.node(n).id.as_deref() == Some("ConsolidatedMember"))
        .unwrap();
    assert!(pre_tree.node(consolidated_member_id).dimension_default);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_explicit_consolidation_member_is_forbidden_in_default_mode() {
    let dir = std::env::temp_dir().join(format!("jpxbrl_pipeline_test_forbidden_{}", std::process::id()));
    write_fixture(&dir);

    let filing = FilingPaths::discover(&dir).unwrap();
    let xml_src = XmlSource::builder().webcache_dir(dir.join("webcache")).build();
    let mut pre_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Presentation).unwrap();
    pre_tree.enrich_schema(&xml_src, "BalanceSheet").unwrap();

    let instance = InstanceAnalyzer::load(&xml_src, &filing.instance_documents()).unwrap();

    let mut axis_members = std::collections::HashMap::new();
    axis_members.insert(
        "ConsolidatedOrNonConsolidatedAxis".to_string(),
        "ConsolidatedMember".to_string(),
    );
    let params = ResolveParams::builder()
        .role_id("BalanceSheet")
        .target_time("CurrentYear")
        .one_before("Prior1Year")
        .axis_members(axis_members)
        .build();

    let err = pre_tree.read_instance_data(&instance, &params).unwrap_err();
    assert!(matches!(err, JpxError::ConsolidationAxisForbidden { .. }));

    std::fs::remove_dir_all(&dir).ok();
}
