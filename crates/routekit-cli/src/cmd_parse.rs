use anyhow::{Context as _, Result};
use routekit::v1::Forest;
use routekit_source::parse_document;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::files::{read_text, to_json};

/// Parse a route file with the selected schema.
pub fn read_document(ctx: &Context, path: &Path) -> Result<(String, Forest)> {
    let text = read_text(path)?;
    let forest = parse_document(&text, ctx.schema()?)
        .with_context(|| format!("failed to parse route file {}", path.display()))?;
    Ok((text, forest))
}

pub fn run(ctx: &Context, input: PathBuf) -> Result<()> {
    let (_, forest) = read_document(ctx, &input)?;
    println!("{}", to_json(&forest, ctx.pretty)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit::v1::Config;
    use tempfile::TempDir;

    #[test]
    fn test_read_document() {
        let ctx = Context {
            config: Config::builtin().unwrap(),
            schema_name: "menu".into(),
            pretty: false,
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menu.php");
        std::fs::write(
            &path,
            "<?php\n\nreturn [\n    MenuItem::make('docs', 'Docs')\n        ->setItems([])->setEndBlock('docs')\n];\n",
        )
        .unwrap();
        let (_, forest) = read_document(&ctx, &path).unwrap();
        assert_eq!(forest.roots[0].title(), Some("Docs"));
    }

    #[test]
    fn test_read_document_wrong_schema() {
        let ctx = Context {
            config: Config::builtin().unwrap(),
            schema_name: "route".into(),
            pretty: false,
        };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menu.php");
        std::fs::write(
            &path,
            "<?php\n\nreturn [\n    MenuItem::make('docs', 'Docs')->setItems([])->setEndBlock('docs')\n];\n",
        )
        .unwrap();
        let err = read_document(&ctx, &path).unwrap_err();
        assert!(format!("{err:#}").contains("expected `Route`"));
    }
}
