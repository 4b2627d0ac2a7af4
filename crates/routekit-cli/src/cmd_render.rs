use anyhow::{Context as _, Result};
use clap::Args;
use routekit::v1::Forest;
use routekit_source::Serializer;
use std::path::PathBuf;

use crate::Context;
use crate::files::{print_diff, read_forest, read_text, write_atomic};
use crate::formatter;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Forest JSON (use - for stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Route file to write; blocks already in it are reused. Prints to
    /// stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Layout: tree or plain (defaults to the configured strategy)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Render every block from its attributes, ignoring the existing file
    #[arg(long)]
    pub only_string_support: bool,

    /// Show the changes to --output instead of writing them
    #[arg(long, requires = "output")]
    pub diff: bool,
}

pub fn run(ctx: &Context, args: RenderArgs) -> Result<()> {
    let forest = read_forest(&args.input)?;
    forest
        .validate()
        .with_context(|| format!("invalid forest in {}", args.input.display()))?;

    let existing = match &args.output {
        Some(path) if path.exists() => Some(read_text(path)?),
        _ => None,
    };
    let text = render_text(ctx, &forest, &args, existing.as_deref())?;

    match &args.output {
        None => print!("{text}"),
        Some(_) if args.diff => print_diff(existing.as_deref().unwrap_or(""), &text),
        Some(path) => {
            write_atomic(path, &text)?;
            log::info!("wrote {} entities to {}", forest.len(), path.display());
        }
    }
    Ok(())
}

fn render_text(
    ctx: &Context,
    forest: &Forest,
    args: &RenderArgs,
    existing: Option<&str>,
) -> Result<String> {
    let schema = ctx.schema()?;
    let output = &ctx.config.output;
    let strategy = args.strategy.as_deref().unwrap_or(&output.strategy);
    let serializer = Serializer::new(schema, strategy)
        .context("invalid --strategy")?
        .only_string_support(args.only_string_support || output.only_string_support);

    let text = serializer
        .serialize(&forest.roots, existing)
        .context("failed to render route file")?;
    formatter::from_config(&output.formatter)
        .format(&text)
        .context("failed to format route file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit::v1::{Config, EntityNode};

    fn ctx() -> Context {
        Context {
            config: Config::builtin().unwrap(),
            schema_name: "route".into(),
            pretty: false,
        }
    }

    fn args(strategy: Option<&str>) -> RenderArgs {
        RenderArgs {
            input: PathBuf::from("-"),
            output: None,
            strategy: strategy.map(str::to_string),
            only_string_support: false,
            diff: false,
        }
    }

    fn forest() -> Forest {
        Forest::from_roots(vec![
            EntityNode::new("home")
                .with_title("Home")
                .with_url("/")
                .with_url_method("GET"),
            EntityNode::new("admin")
                .with_title("Admin")
                .with_child(EntityNode::new("admin.users").with_title("Users")),
        ])
    }

    #[test]
    fn test_render_uses_schema_header_and_rules() {
        let text = render_text(&ctx(), &forest(), &args(None), None).unwrap();
        assert!(text.starts_with("<?php\n\nuse App\\Navigation\\Route;\n\nreturn [\n"));
        assert!(text.contains("->setUrl('/')"));
        assert!(!text.contains("setUrlMethod"));
        assert!(text.contains("            Route::make('admin.users', 'Users')"));
    }

    #[test]
    fn test_render_plain() {
        let text = render_text(&ctx(), &forest(), &args(Some("plain")), None).unwrap();
        assert!(text.contains("->setItems(['admin.users'])->setEndBlock('admin'),"));
    }

    #[test]
    fn test_render_unknown_strategy() {
        let err = render_text(&ctx(), &forest(), &args(Some("nested")), None).unwrap_err();
        assert!(format!("{err:#}").contains("nested"));
    }

    #[test]
    fn test_render_unknown_schema() {
        let mut ctx = ctx();
        ctx.schema_name = "sidebar".into();
        let err = render_text(&ctx, &forest(), &args(None), None).unwrap_err();
        assert!(err.to_string().contains("sidebar"));
    }
}
