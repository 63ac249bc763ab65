use anyhow::{Context, Result, bail};
use pagemark_config::{Config, InteractionConfig, MarkerConfig};
use pagemark_dom::{Document, parse_document};
use pagemark_engine::{
    Affinity, FileStore, HighlightId, HighlightStore, InteractionTiming, Leaf, MarkerStyle, Point,
    Selection, capture_selection, load_page, locate_leaf,
};
use std::{env, fs, path::Path, process, time::Duration};

mod viewer;

const USAGE: &str = "\
Usage:
  pagemark add <page.html> <page-url> <start> <end>   save a highlight over chars start..end of the page text
  pagemark render <page.html> <page-url>              print the page with its saved highlights painted
  pagemark remove <highlight-id>                      delete a saved highlight
  pagemark list [page-url]                            list saved highlights
  pagemark view <page.html> <page-url>                browse highlights, d deletes the hovered one";

fn marker_style(config: &MarkerConfig) -> MarkerStyle {
    MarkerStyle {
        tag_name: config.tag_name.clone(),
        ids_attribute: config.ids_attribute.clone(),
        primary_attribute: config.primary_attribute.clone(),
        active_attribute: config.active_attribute.clone(),
    }
}

fn interaction_timing(config: &InteractionConfig) -> InteractionTiming {
    InteractionTiming {
        hover_debounce: Duration::from_millis(config.hover_debounce_ms),
        leave_grace: Duration::from_millis(config.leave_grace_ms),
    }
}

fn read_page(path: &str) -> Result<Document> {
    let html = fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read page {path}"))?;
    Ok(parse_document(&html))
}

/// A point `offset` chars into the page text, expressed against a text node.
fn text_point(doc: &Document, offset: usize, affinity: Affinity) -> Result<Point> {
    match locate_leaf(doc, doc.root(), offset, affinity)? {
        Leaf::Text { node, offset } => Ok(Point::new(node, offset)),
        Leaf::Empty(_) => bail!("the page has no text to highlight"),
    }
}

fn add(config: &Config, args: &[String]) -> Result<String> {
    let [page, url, start, end] = args else {
        bail!("add needs <page.html> <page-url> <start> <end>");
    };
    let start: usize = start.parse().context("start must be a char offset")?;
    let end: usize = end.parse().context("end must be a char offset")?;

    let style = marker_style(&config.marker);
    let mut doc = read_page(page)?;
    let selection = Selection::new(
        text_point(&doc, start, Affinity::Forward)?,
        text_point(&doc, end, Affinity::Backward)?,
    );
    let mut store = FileStore::new(&config.store_path);
    let record = capture_selection(&mut doc, &style, &mut store, &selection, url)?;

    Ok(format!("{}\t{:?}\n", record.id, record.text))
}

fn render(config: &Config, args: &[String]) -> Result<String> {
    let [page, url] = args else {
        bail!("render needs <page.html> <page-url>");
    };
    let style = marker_style(&config.marker);
    let mut doc = read_page(page)?;
    let store = FileStore::new(&config.store_path);

    let report = load_page(&mut doc, &style, &store, url);
    for (id, err) in &report.skipped {
        eprintln!("skipped {id}: {err}");
    }
    Ok(format!("{}\n", doc.to_html()))
}

fn remove(config: &Config, args: &[String]) -> Result<String> {
    let [id] = args else {
        bail!("remove needs <highlight-id>");
    };
    let mut store = FileStore::new(&config.store_path);
    store.delete(&HighlightId::from(id.as_str()))?;
    Ok(String::new())
}

fn list(config: &Config, args: &[String]) -> Result<String> {
    let store = FileStore::new(&config.store_path);
    let records = match args {
        [] => store.all()?,
        [url] => store.fetch(url)?,
        _ => bail!("list takes at most one <page-url>"),
    };
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{}\t{}\t{:?}\t{}\n",
            record.id, record.created_at, record.text, record.position
        ));
    }
    Ok(out)
}

fn view(config: &Config, args: &[String]) -> Result<String> {
    let [page, url] = args else {
        bail!("view needs <page.html> <page-url>");
    };
    let style = marker_style(&config.marker);
    let mut doc = read_page(page)?;
    let mut store = FileStore::new(&config.store_path);
    let report = load_page(&mut doc, &style, &store, url);
    log::info!("{} highlights on {url}", report.painted.len());

    viewer::run(doc, style, interaction_timing(&config.interaction), &mut store)?;
    Ok(String::new())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let rest = &args[2..];
    let output = match command.as_str() {
        "add" => add(&config, rest)?,
        "render" => render(&config, rest)?,
        "remove" => remove(&config, rest)?,
        "list" => list(&config, rest)?,
        "view" => view(&config, rest)?,
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup(page: &str) -> (TempDir, Config, String) {
        let dir = TempDir::new().unwrap();
        let page_path = dir.path().join("page.html");
        fs::write(&page_path, page).unwrap();
        let config = Config {
            store_path: dir.path().join("highlights.toml"),
            ..Config::default()
        };
        let page_path = page_path.to_string_lossy().into_owned();
        (dir, config, page_path)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn add_then_render_paints_the_saved_highlight() {
        let (_dir, config, page) = setup("<!DOCTYPE html><p>Hello world</p>");
        let url = "https://example.com/a";

        let added = add(&config, &args(&[&page, url, "6", "11"])).unwrap();
        assert!(added.ends_with("\t\"world\"\n"), "{added}");

        let rendered = render(&config, &args(&[&page, url])).unwrap();
        let id = added.split('\t').next().unwrap();
        assert_eq!(
            rendered,
            format!(
                "<html><head></head><body><p>Hello <mark data-highlight-ids=\"{id}\" data-highlight-id=\"{id}\">world</mark></p></body></html>\n"
            )
        );

        let listed = list(&config, &args(&[url])).unwrap();
        assert!(listed.contains("startnode=/html[1]/body[1]/p[1],startoffset=6"), "{listed}");
    }

    #[test]
    fn removed_highlight_is_no_longer_rendered() {
        let (_dir, config, page) = setup("<p>Hello world</p>");
        let url = "https://example.com/a";
        let added = add(&config, &args(&[&page, url, "0", "5"])).unwrap();
        let id = added.split('\t').next().unwrap();

        remove(&config, &args(&[id])).unwrap();

        assert_eq!(list(&config, &[]).unwrap(), "");
        assert_eq!(
            render(&config, &args(&[&page, url])).unwrap(),
            "<html><head></head><body><p>Hello world</p></body></html>\n"
        );
        assert!(remove(&config, &args(&[id])).is_err());
    }

    #[test]
    fn empty_range_is_rejected_and_not_saved() {
        let (_dir, config, page) = setup("<p>a</p><p>b</p>");

        assert!(add(&config, &args(&[&page, "u", "1", "1"])).is_err());
        assert_eq!(list(&config, &[]).unwrap(), "");
    }
}
