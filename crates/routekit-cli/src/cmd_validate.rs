use anyhow::{Context as _, Result};
use routekit::v1::Forest;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cmd_parse::read_document;
use crate::files::read_forest;

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn load(ctx: &Context, input: &Path) -> Result<Forest> {
    if is_json(input) {
        read_forest(input)
    } else {
        read_document(ctx, input).map(|(_, forest)| forest)
    }
}

pub fn run(ctx: &Context, input: PathBuf) -> Result<()> {
    let forest = load(ctx, &input)?;
    forest
        .validate()
        .with_context(|| format!("{} is invalid", input.display()))?;
    println!(
        "Valid: {} entities, {} roots",
        forest.len(),
        forest.roots.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit::v1::Config;
    use tempfile::TempDir;

    fn ctx() -> Context {
        Context {
            config: Config::builtin().unwrap(),
            schema_name: "route".into(),
            pretty: false,
        }
    }

    #[test]
    fn test_validate_route_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routes.php");
        std::fs::write(
            &path,
            "<?php\n\nreturn [\n    Route::make('a', null)->setItems([])->setEndBlock('a')\n];\n",
        )
        .unwrap();
        assert!(run(&ctx(), path).is_ok());
    }

    #[test]
    fn test_validate_duplicate_ids_in_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","children":[{"id":"b"}]},{"id":"b"}]"#,
        )
        .unwrap();
        let err = run(&ctx(), path).unwrap_err();
        assert!(format!("{err:#}").contains("b"));
    }

    #[test]
    fn test_validate_malformed_route_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routes.php");
        std::fs::write(&path, "<?php echo 'nope';\n").unwrap();
        assert!(run(&ctx(), path).is_err());
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("forest.json")));
        assert!(!is_json(Path::new("routes.php")));
        assert!(!is_json(Path::new("-")));
    }
}
