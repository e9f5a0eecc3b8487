//! Routing manifest edits.
//!
//! The manifest is edited textually around two fixed markers: the router
//! import line and the opening of the exported route table. [`insert_route`]
//! reports what it added as [`RouteChanges`], and [`remove_route`] takes back
//! only those pieces. Insertions use exact literals so the removal is byte
//! for byte; for manifests edited by hand since, removal falls back to
//! patterns.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::component::ComponentName;
use crate::error::PipelineError;

pub const IMPORT_MARKER: &str = "import { Routes } from '@angular/router';";
pub const TABLE_MARKER: &str = "export const routes: Routes = [";
const TABLE_END: &str = "];";

/// One route registration: URL path plus the exported component symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: String,
    pub symbol: String,
    import_path: String,
}

impl RouteEntry {
    pub fn for_component(component: &ComponentName) -> Self {
        Self {
            path: component.as_str().to_string(),
            symbol: component.class_name(),
            import_path: component.import_path(),
        }
    }

    pub fn import_statement(&self) -> String {
        format!("import {{ {} }} from '{}';", self.symbol, self.import_path)
    }

    pub fn route_literal(&self) -> String {
        format!("{{ path: '{}', component: {} }}", self.path, self.symbol)
    }

    fn route_pattern(&self) -> Regex {
        let pattern = format!(
            r#"\{{\s*path:\s*['"]{}['"],\s*component:\s*{}\s*\}},?[ \t]*\r?\n?"#,
            regex::escape(&self.path),
            regex::escape(&self.symbol)
        );
        Regex::new(&pattern).expect("escaped route pattern is valid")
    }

    fn import_pattern(&self) -> Regex {
        let pattern = format!(
            r#"(?m)\r?\n?^[ \t]*import\s*\{{\s*{}\s*\}}\s*from\s*['"][^'"]*['"];?[ \t]*"#,
            regex::escape(&self.symbol)
        );
        Regex::new(&pattern).expect("escaped import pattern is valid")
    }
}

/// The pieces one registration added to the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteChanges {
    pub import_added: bool,
    pub route_added: bool,
}

impl RouteChanges {
    pub fn is_empty(&self) -> bool {
        !self.import_added && !self.route_added
    }
}

/// Result of a pure manifest edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEdit {
    pub content: String,
    pub changes: RouteChanges,
}

impl ManifestEdit {
    fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            changes: RouteChanges::default(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Byte range of the exported table's body: from just after `[` up to its
/// closing `];`, or to the end of the text when that is missing.
fn route_table(content: &str) -> Option<(usize, usize)> {
    let open = content.find(TABLE_MARKER)? + TABLE_MARKER.len();
    let close = content[open..]
        .find(TABLE_END)
        .map_or(content.len(), |i| open + i);
    Some((open, close))
}

fn path_in_use(table: &str, path: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"path:\s*['"]([^'"]*)['"]"#).expect("route path pattern is valid")
    });
    re.captures_iter(table).any(|c| &c[1] == path)
}

/// Register `entry` in `manifest`.
///
/// Nothing is added when the import statement is already present or the
/// route table already registers the path. An import of the same symbol in
/// another form is reused rather than duplicated. A missing marker skips
/// that half of the edit.
pub fn insert_route(manifest: &str, entry: &RouteEntry) -> ManifestEdit {
    let import = entry.import_statement();
    if manifest.contains(&import) {
        tracing::warn!(symbol = %entry.symbol, "import already present; route update skipped");
        return ManifestEdit::unchanged(manifest);
    }
    if let Some((open, close)) = route_table(manifest) {
        if path_in_use(&manifest[open..close], &entry.path) {
            tracing::warn!(path = %entry.path, "route path already registered; route update skipped");
            return ManifestEdit::unchanged(manifest);
        }
    }

    let mut content = manifest.to_string();
    let mut changes = RouteChanges::default();

    if entry.import_pattern().is_match(&content) {
        tracing::debug!(symbol = %entry.symbol, "symbol already imported");
    } else {
        match content.find(IMPORT_MARKER) {
            Some(pos) => {
                content.insert_str(pos + IMPORT_MARKER.len(), &format!("\n{}", import));
                changes.import_added = true;
            }
            None => tracing::warn!("router import marker not found; import not added"),
        }
    }

    match route_table(&content) {
        Some((open, close)) => {
            let literal = if content[open..close].trim().is_empty() {
                format!("\n  {}\n", entry.route_literal())
            } else {
                format!("\n  {},", entry.route_literal())
            };
            content.insert_str(open, &literal);
            changes.route_added = true;
        }
        None => tracing::warn!("route table marker not found; route not added"),
    }

    ManifestEdit { content, changes }
}

/// Undo [`insert_route`], touching only what `changes` says it added.
/// Exact literals first, then patterns. The route is looked for inside the
/// exported table only.
pub fn remove_route(manifest: &str, entry: &RouteEntry, changes: RouteChanges) -> ManifestEdit {
    let mut content = manifest.to_string();
    let mut removed = RouteChanges::default();

    if changes.import_added {
        let end = content.len();
        let literal = format!("\n{}", entry.import_statement());
        removed.import_added = remove_first(&mut content, 0, end, &literal)
            || remove_pattern(&mut content, 0, end, &entry.import_pattern());
    }

    if changes.route_added {
        let (from, to) = route_table(&content).unwrap_or((0, content.len()));
        let route = entry.route_literal();
        removed.route_added = remove_first(&mut content, from, to, &format!("\n  {},", route))
            || remove_first(&mut content, from, to, &format!("\n  {}\n", route))
            || remove_pattern(&mut content, from, to, &entry.route_pattern());
    }

    ManifestEdit {
        content,
        changes: removed,
    }
}

fn remove_first(content: &mut String, from: usize, to: usize, literal: &str) -> bool {
    match content[from..to].find(literal) {
        Some(i) => {
            let pos = from + i;
            content.replace_range(pos..pos + literal.len(), "");
            true
        }
        None => false,
    }
}

fn remove_pattern(content: &mut String, from: usize, to: usize, re: &Regex) -> bool {
    match re.find(&content[from..to]) {
        Some(m) => {
            content.replace_range(from + m.start()..from + m.end(), "");
            true
        }
        None => false,
    }
}

// ── File wrappers ────────────────────────────────────────────────────────────

fn read_manifest(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))
}

fn write_if_changed(path: &Path, edit: &ManifestEdit) -> Result<bool, PipelineError> {
    if edit.is_changed() {
        std::fs::write(path, &edit.content).map_err(|e| PipelineError::io(path, e))?;
    }
    Ok(edit.is_changed())
}

/// Register the component's route in the manifest file. Returns what was
/// added; hand it back to [`revert_routes`].
pub fn update_routes(
    manifest: &Path,
    component: &ComponentName,
) -> Result<RouteChanges, PipelineError> {
    let entry = RouteEntry::for_component(component);
    let edit = insert_route(&read_manifest(manifest)?, &entry);
    if write_if_changed(manifest, &edit)? {
        tracing::info!(
            path = %entry.path,
            symbol = %entry.symbol,
            import_added = edit.changes.import_added,
            route_added = edit.changes.route_added,
            "route registered"
        );
    }
    Ok(edit.changes)
}

/// Take back what [`update_routes`] added. Returns whether the file was
/// rewritten.
pub fn revert_routes(
    manifest: &Path,
    component: &ComponentName,
    changes: RouteChanges,
) -> Result<bool, PipelineError> {
    let entry = RouteEntry::for_component(component);
    if changes.is_empty() {
        tracing::debug!(path = %entry.path, "no route to revert");
        return Ok(false);
    }
    let edit = remove_route(&read_manifest(manifest)?, &entry, changes);
    let written = write_if_changed(manifest, &edit)?;
    if written {
        tracing::info!(path = %entry.path, "route reverted");
    } else {
        tracing::warn!(path = %entry.path, "registered route no longer in manifest");
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "import { Routes } from '@angular/router';\nimport { DemoComponent } from './components/demo/demo.component';\n\nexport const routes: Routes = [\n  { path: 'demo', component: DemoComponent },\n  { path: '**', redirectTo: '' }\n];\n";

    const EMPTY_MANIFEST: &str =
        "import { Routes } from '@angular/router';\n\nexport const routes: Routes = [];\n";

    const BOTH: RouteChanges = RouteChanges {
        import_added: true,
        route_added: true,
    };

    fn entry() -> RouteEntry {
        RouteEntry::for_component(&ComponentName::parse("hero-banner").unwrap())
    }

    #[test]
    fn test_entry_literals() {
        let e = entry();
        assert_eq!(
            e.import_statement(),
            "import { HeroBannerComponent } from './components/hero-banner/hero-banner.component';"
        );
        assert_eq!(
            e.route_literal(),
            "{ path: 'hero-banner', component: HeroBannerComponent }"
        );
    }

    #[test]
    fn test_insert_into_populated_table() {
        let edit = insert_route(MANIFEST, &entry());
        assert_eq!(edit.changes, BOTH);
        assert!(edit.content.starts_with(
            "import { Routes } from '@angular/router';\nimport { HeroBannerComponent } from './components/hero-banner/hero-banner.component';\n"
        ));
        assert!(edit.content.contains(
            "export const routes: Routes = [\n  { path: 'hero-banner', component: HeroBannerComponent },\n  { path: 'demo'"
        ));
    }

    #[test]
    fn test_insert_into_empty_table() {
        let edit = insert_route(EMPTY_MANIFEST, &entry());
        assert!(edit.content.contains(
            "export const routes: Routes = [\n  { path: 'hero-banner', component: HeroBannerComponent }\n];"
        ));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let once = insert_route(MANIFEST, &entry()).content;
        let twice = insert_route(&once, &entry());
        assert!(!twice.is_changed());
        assert_eq!(twice.content, once);
        assert_eq!(once.matches("HeroBannerComponent }").count(), 2);
    }

    #[test]
    fn test_round_trip_is_exact() {
        for manifest in [MANIFEST, EMPTY_MANIFEST] {
            let inserted = insert_route(manifest, &entry());
            let reverted = remove_route(&inserted.content, &entry(), inserted.changes);
            assert_eq!(reverted.changes, BOTH);
            assert_eq!(reverted.content, manifest);
        }
    }

    #[test]
    fn test_existing_registration_is_left_alone() {
        let manifest = "import { Routes } from '@angular/router';\nimport { HeroBannerComponent } from \"./components/hero-banner/hero-banner.component\";\n\nexport const routes: Routes = [\n  { path: 'hero-banner', component: HeroBannerComponent },\n  { path: 'demo', component: DemoComponent },\n];\n";
        let inserted = insert_route(manifest, &entry());
        assert!(!inserted.is_changed());
        assert_eq!(inserted.content, manifest);

        let reverted = remove_route(&inserted.content, &entry(), inserted.changes);
        assert!(!reverted.is_changed());
        assert_eq!(reverted.content, manifest);
    }

    #[test]
    fn test_existing_import_in_other_form_is_reused() {
        let manifest = "import { Routes } from '@angular/router';\nimport {HeroBannerComponent} from \"./components/hero-banner/hero-banner.component\";\n\nexport const routes: Routes = [\n  { path: 'demo', component: DemoComponent },\n];\n";
        let inserted = insert_route(manifest, &entry());
        assert_eq!(
            inserted.changes,
            RouteChanges {
                import_added: false,
                route_added: true
            }
        );
        assert_eq!(inserted.content.matches("HeroBannerComponent}").count(), 1);

        let reverted = remove_route(&inserted.content, &entry(), inserted.changes);
        assert_eq!(reverted.content, manifest);
    }

    #[test]
    fn test_path_in_later_table_does_not_block_insert() {
        let manifest = "import { Routes } from '@angular/router';\n\nexport const routes: Routes = [\n  { path: 'demo', component: DemoComponent },\n];\n\nexport const adminRoutes: Routes = [\n  { path: 'hero-banner', component: HeroBannerComponent },\n];\n";
        let inserted = insert_route(manifest, &entry());
        assert_eq!(inserted.changes, BOTH);
        assert!(inserted.content.contains(
            "export const routes: Routes = [\n  { path: 'hero-banner', component: HeroBannerComponent },\n  { path: 'demo'"
        ));

        let reverted = remove_route(&inserted.content, &entry(), inserted.changes);
        assert_eq!(reverted.content, manifest);
        assert!(reverted.content.contains("adminRoutes: Routes = [\n  { path: 'hero-banner'"));
    }

    #[test]
    fn test_existing_path_not_duplicated() {
        let manifest = "import { Routes } from '@angular/router';\n\nexport const routes: Routes = [\n  { path: 'hero-banner', component: OldHeroComponent }\n];\n";
        let edit = insert_route(manifest, &entry());
        assert!(!edit.is_changed());
        assert_eq!(edit.content, manifest);
    }

    #[test]
    fn test_remove_from_hand_edited_manifest() {
        let edited = "import { Routes } from '@angular/router';\nimport {HeroBannerComponent} from \"./components/hero-banner/hero-banner.component\";\n\nexport const routes: Routes = [\n  {path: \"hero-banner\", component: HeroBannerComponent},\n  { path: 'demo', component: DemoComponent },\n];\n";
        let reverted = remove_route(edited, &entry(), BOTH).content;
        assert!(!reverted.contains("HeroBanner"));
        assert!(reverted.contains("{ path: 'demo', component: DemoComponent }"));
        assert!(reverted.starts_with("import { Routes } from '@angular/router';\n\nexport const"));
    }

    #[test]
    fn test_remove_only_what_was_added() {
        let inserted = insert_route(MANIFEST, &entry()).content;
        let import_only = RouteChanges {
            import_added: true,
            route_added: false,
        };
        let edit = remove_route(&inserted, &entry(), import_only);
        assert_eq!(edit.changes, import_only);
        assert!(edit
            .content
            .contains("{ path: 'hero-banner', component: HeroBannerComponent }"));

        let nothing = remove_route(&inserted, &entry(), RouteChanges::default());
        assert!(!nothing.is_changed());
        assert_eq!(nothing.content, inserted);
    }

    #[test]
    fn test_remove_when_absent_is_noop() {
        let edit = remove_route(MANIFEST, &entry(), BOTH);
        assert!(!edit.is_changed());
        assert_eq!(edit.content, MANIFEST);
    }

    #[test]
    fn test_missing_markers_skip_with_no_change() {
        let edit = insert_route("const nothing = 1;\n", &entry());
        assert!(!edit.is_changed());
    }

    #[test]
    fn test_file_wrappers() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.routes.ts");
        std::fs::write(&file, MANIFEST).unwrap();
        let component = ComponentName::parse("hero-banner").unwrap();

        let changes = update_routes(&file, &component).unwrap();
        assert_eq!(changes, BOTH);
        assert!(update_routes(&file, &component).unwrap().is_empty());
        assert!(revert_routes(&file, &component, changes).unwrap());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), MANIFEST);
    }

    #[test]
    fn test_revert_without_changes_does_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let component = ComponentName::parse("hero-banner").unwrap();
        let missing = dir.path().join("nope.ts");
        assert!(!revert_routes(&missing, &component, RouteChanges::default()).unwrap());
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let component = ComponentName::parse("hero-banner").unwrap();
        let err = update_routes(&dir.path().join("nope.ts"), &component).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
