// ABOUTME: Help entries for the function catalog, rendered in the REPL

use crate::functions::FunctionRegistry;

/// One help entry, derived straight from a registered signature.
#[derive(Debug, Clone)]
pub struct HelpEntry {
    pub name: String,
    pub signature: String,
    pub description: String,
}

/// Entries for every registered function, sorted by name. When a name was
/// registered more than once the last registration wins, matching the
/// linker's resolution rule.
pub fn catalog_entries(registry: &FunctionRegistry) -> Vec<HelpEntry> {
    let (table, _) = registry.build_table();
    let mut entries: Vec<HelpEntry> = table
        .values()
        .map(|function| {
            let signature = function.signature();
            HelpEntry {
                name: signature.name.clone(),
                signature: signature.render(),
                description: signature.description.clone(),
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Markdown help text for the whole catalog, ready for termimad.
pub fn render_catalog(registry: &FunctionRegistry) -> String {
    let mut text = String::from("# Functions\n\n");
    for entry in catalog_entries(registry) {
        text.push_str(&format!("**`{}`**\n", entry.signature));
        if !entry.description.is_empty() {
            text.push_str(&format!("> {}\n", entry.description));
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_cover_the_standard_library() {
        let mut registry = FunctionRegistry::new();
        crate::builtins::register_builtins(&mut registry);
        let entries = catalog_entries(&registry);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Upper"));
        assert!(names.contains(&"CallScript"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_render_includes_signatures() {
        let mut registry = FunctionRegistry::new();
        crate::builtins::register_builtins(&mut registry);
        let text = render_catalog(&registry);
        assert!(text.contains("Upper(text: string): string"));
    }
}
