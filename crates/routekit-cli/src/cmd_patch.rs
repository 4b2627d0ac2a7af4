use anyhow::{Context as _, Result, bail};
use clap::Args;
use routekit::v1::Schema;
use routekit_source::{Patcher, Strategy};
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cmd_parse::read_document;
use crate::files::{print_diff, read_node, write_atomic};
use crate::formatter;

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Route file to patch in place
    #[arg(short, long)]
    pub file: PathBuf,

    /// Entity JSON with the new attributes and children (use - for stdin)
    #[arg(short, long)]
    pub entity: PathBuf,

    /// Tree depth of the entity (defaults to its depth in the file)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Show the change instead of writing it
    #[arg(long)]
    pub diff: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Route file to edit in place
    #[arg(short, long)]
    pub file: PathBuf,

    /// Id of the entity to remove
    #[arg(long)]
    pub id: String,

    /// Show the change instead of writing it
    #[arg(long)]
    pub diff: bool,
}

pub fn run_patch(ctx: &Context, args: PatchArgs) -> Result<()> {
    let node = read_node(&args.entity)?;
    let (text, forest) = read_document(ctx, &args.file)?;
    let Some(current) = forest.find(&node.id) else {
        bail!("no entity {:?} in {}", node.id, args.file.display());
    };
    let depth = match args.depth {
        Some(depth) => depth,
        None => forest.depth_of(&node.id).unwrap_or(0),
    };

    let schema = ctx.schema()?;
    let patched = configured_patcher(ctx, schema)?
        .replace_with(&text, current, &node, depth)
        .context("failed to patch route file")?;
    let Some(patched) = patched else {
        bail!(
            "could not locate the block of {:?} in {}; regenerate the file with `routekit render`",
            node.id,
            args.file.display()
        );
    };
    finish(ctx, &args.file, &text, &patched, args.diff)
}

pub fn run_remove(ctx: &Context, args: RemoveArgs) -> Result<()> {
    let (text, forest) = read_document(ctx, &args.file)?;
    let Some(current) = forest.find(&args.id) else {
        bail!("no entity {:?} in {}", args.id, args.file.display());
    };

    let schema = ctx.schema()?;
    let patcher = configured_patcher(ctx, schema)?;
    let removed = patcher
        .remove(&text, current)
        .context("failed to edit route file")?;
    let Some(mut removed) = removed else {
        bail!(
            "could not locate the block of {:?} in {}",
            args.id,
            args.file.display()
        );
    };

    // Plain parents list their children by id; drop the stale reference.
    if patcher.strategy() == Strategy::Plain
        && let Some(parent) = forest.parent_of(&args.id)
    {
        let mut parent = parent.clone();
        parent.children.retain(|child| child.id != args.id);
        if let Some(relisted) = patcher
            .replace_children(&removed, &parent, 0)
            .context("failed to edit route file")?
        {
            removed = relisted;
        }
    }
    finish(ctx, &args.file, &text, &removed, args.diff)
}

fn configured_patcher<'a>(ctx: &Context, schema: &'a Schema) -> Result<Patcher<'a>> {
    let strategy: Strategy = ctx
        .config
        .output
        .strategy
        .parse()
        .context("invalid output strategy in config")?;
    Ok(Patcher::with_strategy(schema, strategy))
}

fn finish(ctx: &Context, path: &Path, old: &str, new: &str, diff: bool) -> Result<()> {
    let new = formatter::from_config(&ctx.config.output.formatter)
        .format(new)
        .context("failed to format route file")?;
    if diff {
        print_diff(old, &new);
        return Ok(());
    }
    write_atomic(path, &new)?;
    log::info!("updated {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit::v1::Config;
    use tempfile::TempDir;

    const ROUTES: &str = "<?php

return [
    Route::make('home', 'Home')
        ->setUrl('/')
        ->setItems([])->setEndBlock('home'),
    Route::make('admin', 'Admin')
        ->setUrl('/admin')
        ->setItems([
            Route::make('admin.users', 'Users')
                ->setUrl('/admin/users')
                ->setItems([])->setEndBlock('admin.users')
        ])->setEndBlock('admin')
];
";

    fn ctx() -> Context {
        Context {
            config: Config::builtin().unwrap(),
            schema_name: "route".into(),
            pretty: false,
        }
    }

    fn setup(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("routes.php");
        std::fs::write(&path, ROUTES).unwrap();
        path
    }

    #[test]
    fn test_patch_uses_depth_from_file() {
        let dir = TempDir::new().unwrap();
        let file = setup(&dir);
        let entity = dir.path().join("users.json");
        std::fs::write(
            &entity,
            r#"{"id":"admin.users","attributes":{"title":"People","url":"/admin/people"}}"#,
        )
        .unwrap();

        run_patch(
            &ctx(),
            PatchArgs {
                file: file.clone(),
                entity,
                depth: None,
                diff: false,
            },
        )
        .unwrap();

        let out = std::fs::read_to_string(&file).unwrap();
        assert!(out.contains(
            "            Route::make('admin.users', 'People')\n                ->setUrl('/admin/people')\n                ->setItems([])->setEndBlock('admin.users')\n        ])"
        ));
        assert!(out.starts_with(&ROUTES[..ROUTES.find("            Route::make('admin.users'").unwrap()]));
    }

    #[test]
    fn test_patch_unknown_entity() {
        let dir = TempDir::new().unwrap();
        let file = setup(&dir);
        let entity = dir.path().join("x.json");
        std::fs::write(&entity, r#"{"id":"reports"}"#).unwrap();
        let err = run_patch(
            &ctx(),
            PatchArgs {
                file: file.clone(),
                entity,
                depth: None,
                diff: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("reports"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), ROUTES);
    }

    #[test]
    fn test_patch_diff_does_not_write() {
        let dir = TempDir::new().unwrap();
        let file = setup(&dir);
        let entity = dir.path().join("home.json");
        std::fs::write(&entity, r#"{"id":"home","attributes":{"title":"Home","url":"/start"}}"#)
            .unwrap();
        run_patch(
            &ctx(),
            PatchArgs {
                file: file.clone(),
                entity,
                depth: None,
                diff: true,
            },
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), ROUTES);
    }

    #[test]
    fn test_remove_child() {
        let dir = TempDir::new().unwrap();
        let file = setup(&dir);
        run_remove(
            &ctx(),
            RemoveArgs {
                file: file.clone(),
                id: "admin.users".into(),
                diff: false,
            },
        )
        .unwrap();
        let out = std::fs::read_to_string(&file).unwrap();
        assert!(!out.contains("admin.users"));
        assert!(out.contains("->setEndBlock('home'),"));
        assert!(out.ends_with("        ->setUrl('/admin')\n        ->setItems([])->setEndBlock('admin')\n];\n"));
        let (_, forest) = read_document(&ctx(), &file).unwrap();
        assert!(forest.find("admin").unwrap().children.is_empty());
    }

    const PLAIN_ROUTES: &str = "<?php

return [
    Route::make('home', 'Home')
        ->setItems([])->setEndBlock('home'),
    Route::make('admin', 'Admin')
        ->setItems(['admin.users', 'admin.roles'])->setEndBlock('admin'),
    Route::make('admin.users', 'Users')
        ->setItems([])->setEndBlock('admin.users'),
    Route::make('admin.roles', 'Roles')
        ->setItems([])->setEndBlock('admin.roles'),
];
";

    fn plain_ctx() -> Context {
        let mut ctx = ctx();
        ctx.config.output.strategy = "plain".into();
        ctx
    }

    #[test]
    fn test_patch_plain_keeps_layout() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("routes.php");
        std::fs::write(&file, PLAIN_ROUTES).unwrap();
        let entity = dir.path().join("admin.json");
        std::fs::write(
            &entity,
            r#"{"id":"admin","attributes":{"title":"Admin","url":"/admin"},"children":[{"id":"admin.users"},{"id":"admin.roles"}]}"#,
        )
        .unwrap();

        run_patch(
            &plain_ctx(),
            PatchArgs {
                file: file.clone(),
                entity,
                depth: None,
                diff: false,
            },
        )
        .unwrap();

        let out = std::fs::read_to_string(&file).unwrap();
        assert!(out.contains(
            "    Route::make('admin', 'Admin')\n        ->setUrl('/admin')\n        ->setItems(['admin.users', 'admin.roles'])->setEndBlock('admin'),\n"
        ));
        assert_eq!(out.matches("Route::make('admin.users'").count(), 1);
        let (_, forest) = read_document(&plain_ctx(), &file).unwrap();
        assert!(forest.validate().is_ok());
        assert_eq!(forest.roots.len(), 2);
    }

    #[test]
    fn test_remove_plain_drops_reference() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("routes.php");
        std::fs::write(&file, PLAIN_ROUTES).unwrap();
        run_remove(
            &plain_ctx(),
            RemoveArgs {
                file: file.clone(),
                id: "admin.users".into(),
                diff: false,
            },
        )
        .unwrap();
        let out = std::fs::read_to_string(&file).unwrap();
        assert!(!out.contains("admin.users"));
        assert!(out.contains("->setItems(['admin.roles'])->setEndBlock('admin'),"));
    }

    #[test]
    fn test_remove_unknown() {
        let dir = TempDir::new().unwrap();
        let file = setup(&dir);
        let err = run_remove(
            &ctx(),
            RemoveArgs {
                file,
                id: "nope".into(),
                diff: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
