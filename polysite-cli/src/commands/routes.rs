//! Route listing: what each language gets for each page.

use super::load_model;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct RouteInfo<'a> {
    route: &'a str,
    page: &'a str,
    language: &'a str,
    fragment: &'a str,
}

#[derive(Serialize)]
struct RouteListing<'a> {
    pages: Vec<RouteInfo<'a>>,
    passthrough: Vec<&'a str>,
    skipped: &'a [String],
}

pub fn list_routes(config_path: &Path, json: bool) -> Result<()> {
    let (_config, model) = load_model(config_path)?;

    let listing = RouteListing {
        pages: model
            .pages()
            .iter()
            .map(|(route, entry)| RouteInfo {
                route,
                page: &entry.page,
                language: &entry.data.lang.tag,
                fragment: &entry.fragment_tag,
            })
            .collect(),
        passthrough: model.passthrough().iter().map(String::as_str).collect(),
        skipped: model.skipped(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for info in &listing.pages {
        let marker = if info.fragment.eq_ignore_ascii_case(info.language) {
            ""
        } else {
            " (fallback)"
        };
        println!("/{}\t{}{}", info.route, info.fragment, marker);
    }
    for name in &listing.passthrough {
        println!("/{}\tpass-through", name);
    }
    for name in listing.skipped {
        println!("{}\tskipped: no fragments", name);
    }
    Ok(())
}
