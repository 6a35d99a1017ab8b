//! Command-line driver: reconstruct one role of a filing's presentation
//! tree and resolve facts for the current and prior reporting period.
//!
//! ```text
//! jpxbrl <filing-dir> <role-short-name> <target-time> <one-before>
//! ```

use std::env;
use std::process::ExitCode;

use jpxbrl::prelude::*;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        eprintln!("usage: jpxbrl <filing-dir> <role-short-name> <target-time> <one-before>");
        return ExitCode::FAILURE;
    }

    match run(&args[1], &args[2], &args[3], &args[4]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(filing_dir: &str, role: &str, target_time: &str, one_before: &str) -> JpxResult<()> {
    let filing = FilingPaths::discover(filing_dir)?;
    let xml_src = XmlSource::builder().build();

    let mut pre_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Presentation)?;
    let def_tree = LinkbaseTree::load(&xml_src, &filing, LinkbaseKind::Definition)?;

    pre_tree.enrich_schema(&xml_src, role)?;
    pre_tree.enrich_labels(&xml_src, &filing, role)?;
    pre_tree.set_dimension_default(&def_tree, role)?;

    let instance = InstanceAnalyzer::load(&xml_src, &filing.instance_documents())?;

    let params = ResolveParams::builder()
        .role_id(role)
        .target_time(target_time)
        .one_before(one_before)
        .build();
    params.validate_all().map_err(|e| JpxError::Other(e.to_string()))?;

    pre_tree.read_instance_data(&instance, &params)?;

    print_tree(&pre_tree, role)?;
    Ok(())
}

fn print_tree(tree: &LinkbaseTree, role: &str) -> JpxResult<()> {
    let root = tree
        .role_node_id(role)
        .ok_or_else(|| JpxError::RoleNotFound { role: role.to_string() })?;

    for node_id in tree.walk(root) {
        let depth = depth_of(tree, node_id);
        println!("{}{}", "  ".repeat(depth), tree.node(node_id));
    }
    Ok(())
}

fn depth_of(tree: &LinkbaseTree, mut node_id: NodeId) -> usize {
    let mut depth = 0;
    while let Some(parent) = tree.node(node_id).parent {
        depth += 1;
        node_id = parent;
    }
    depth
}
