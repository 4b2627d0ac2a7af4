use anyhow::Result;
use routekit::v1::{EntityNode, Forest, query};
use serde::Serialize;
use std::path::PathBuf;

use crate::Context;
use crate::cmd_parse::read_document;
use crate::files::to_json;

#[derive(Debug, Serialize)]
struct Entry<'a> {
    id: &'a str,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

fn entries(forest: &Forest) -> Vec<Entry<'_>> {
    forest
        .walk()
        .into_iter()
        .map(|(depth, node)| Entry {
            id: &node.id,
            depth,
            parent: query::parent_of(&forest.roots, &node.id).map(|p| p.id.as_str()),
            title: node.title(),
        })
        .collect()
}

fn line(depth: usize, node: &EntityNode) -> String {
    let indent = "  ".repeat(depth);
    match node.title() {
        Some(title) => format!("{indent}{}  {title}", node.id),
        None => format!("{indent}{}", node.id),
    }
}

pub fn run(ctx: &Context, input: PathBuf, json: bool) -> Result<()> {
    let (_, forest) = read_document(ctx, &input)?;
    if json {
        println!("{}", to_json(&entries(&forest), ctx.pretty)?);
        return Ok(());
    }
    if forest.is_empty() {
        eprintln!("no entities in {}", input.display());
        return Ok(());
    }
    for (depth, node) in forest.walk() {
        println!("{}", line(depth, node));
    }
    Ok(())
}
