//! Top-level orchestration (spec §4.9, §6): build an [`Atlas`], run the
//! resolver, write every output artifact, and flush diagnostics. Grounded
//! on the teacher's `Everything::load`/validation-pass driving in
//! `ck3-tiger/src/main.rs`, generalized here to the resolve-then-write
//! shape `item_source_new/main.py::get_item_sources` + the wiki-export
//! scripts imply.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::context::Atlas;
use crate::output::{categorize, lua, yaml};
use crate::{diagnostics, resolver};

/// Runs one full pass: resolve provenance, write every `lua/`/`yaml/`
/// artifact under `config.output_dir`, then flush accumulated diagnostics
/// to stderr. `purge` forces the scene-interest cache to be rebuilt rather
/// than reused.
pub fn run(config: Config, purge: bool) -> Result<()> {
    let atlas = Atlas::new(config);

    // Force the cache lifecycle decision up front so a `--purge` run always
    // rescans scenes even if nothing downstream happens to need them yet.
    atlas.interest_points(purge).context("scanning scene interest points")?;

    let split = resolver::resolve(&atlas).context("resolving item provenance")?;
    let categories = categorize(&split);

    write_outputs(&atlas, &split, &categories)?;

    diagnostics::emit_to_stderr();
    Ok(())
}

/// Builds the `configList` record for one item: its id, the tag paths of
/// every main source, and every secondary-source tag path, matching the
/// `mainSources`/`secondarySources` fields `script/item_source.py::
/// format_results` attaches to each item — without that script's further
/// friendly-name translation step, which is wiki-page template assembly and
/// stays out of scope (spec §0 Out of scope).
fn item_record(item_id: crate::model::ItemId, split: &resolver::SplitProvenance) -> serde_json::Value {
    let mut main: Vec<String> =
        split.main.get(&item_id).map(|sources| sources.iter().map(|tags| tags.join(":")).collect()).unwrap_or_default();
    main.sort();
    let mut secondary: Vec<String> =
        split.secondary.get(&item_id).map(|sources| sources.iter().map(|tags| tags.join(":")).collect()).unwrap_or_default();
    secondary.sort();

    serde_json::json!({
        "id": item_id.get(),
        "mainSources": main,
        "secondarySources": secondary,
    })
}

fn write_outputs(atlas: &Atlas, split: &resolver::SplitProvenance, categories: &[categorize::Category]) -> Result<()> {
    let lua_dir = atlas.config.output_dir.join("lua");
    let yaml_dir = atlas.config.output_dir.join("yaml");
    std::fs::create_dir_all(&lua_dir).context("creating lua output directory")?;
    std::fs::create_dir_all(&yaml_dir).context("creating yaml output directory")?;

    for category in categories {
        let config_list: serde_json::Value =
            serde_json::Value::Array(category.items.iter().map(|&id| item_record(id, split)).collect());

        let lua_path = lua_dir.join(format!("{}.lua", category.tag));
        let lua_text = lua::render(&atlas.config.version, &category.tag, &config_list);
        std::fs::write(&lua_path, lua_text).with_context(|| format!("writing {}", lua_path.display()))?;

        let yaml_path = yaml_dir.join(format!("{}.yaml", category.tag));
        let yaml_text = yaml::render(&config_list);
        std::fs::write(&yaml_path, yaml_text).with_context(|| format!("writing {}", yaml_path.display()))?;
    }

    Ok(())
}
