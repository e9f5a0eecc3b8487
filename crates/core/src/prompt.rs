//! Prompt construction for component generation.
//!
//! The three fenced blocks at the end of the prompt (`typescript`, `html`,
//! `scss`) are the contract [`crate::parse`] relies on. Changing their labels
//! breaks parsing.

use crate::brand::BrandStyleSet;
use crate::component::ComponentName;
use crate::design::DesignNode;

/// Characters of serialized design data included in the prompt.
pub const DESIGN_CHAR_BUDGET: usize = 5000;

/// Fence labels shared with the parser.
pub const SCRIPT_FENCE: &str = "```typescript";
pub const MARKUP_FENCE: &str = "```html";
pub const STYLESHEET_FENCE: &str = "```scss";

/// Serialize the node and keep the first [`DESIGN_CHAR_BUDGET`] characters.
///
/// Cuts mid-token on purpose; the model only needs the gist of the tree.
pub fn truncated_design(node: &DesignNode) -> String {
    let json = node.to_pretty_json();
    match json.char_indices().nth(DESIGN_CHAR_BUDGET) {
        None => json,
        Some((idx, _)) => format!("{}...", &json[..idx]),
    }
}

/// Build the full generation prompt. Pure: same inputs, same text.
pub fn build_prompt(node: &DesignNode, styles: &BrandStyleSet, component: &ComponentName) -> String {
    let design = truncated_design(node);
    let classes = styles.classes().collect::<Vec<_>>().join(", ");
    let class_count = styles.len();
    let name = component.as_str();
    let class_name = component.class_name();

    format!(
        r#"You are an expert Angular developer. Generate a complete Angular standalone component from this Figma design.

CRITICAL SYSTEM CONSTRAINTS - VIOLATIONS WILL BREAK THE APPLICATION

This Angular project uses CUSTOM BRAND CSS ONLY.
Tailwind CSS is NOT installed. Bootstrap is NOT installed.

FORBIDDEN CLASSES:
- h-screen, w-screen, min-h-screen
- text-lg, text-base, text-sm, text-xl
- py-2, px-4, p-8, m-4
- opacity-0 through opacity-100
- bg-gradient-to-*

APPROVED CSS CLASSES - ONLY USE THESE {class_count} CLASSES:
{classes}

STRICT RULES:
1. If a CSS class is NOT in the approved list above -> DO NOT USE IT
2. Need gradient? -> Use inline style: [style]="'background: linear-gradient(...)'"
3. Need opacity? -> Use inline style: [style]="'opacity: 0.6'"
4. Need sizing? -> Use inline style: [style]="'width: 300px; height: 200px'"

FIGMA DESIGN DATA:
{design}

COMPONENT NAME: {name}

Generate 3 files with proper Angular 20+ standalone component structure:

1. TypeScript Component (.ts):
   CORRECT IMPORTS:
   - import {{ Component }} from '@angular/core';
   - import {{ CommonModule }} from '@angular/common';

   FORBIDDEN IMPORTS (these will cause syntax errors):
   - DO NOT import: standalone, NgModule, Injector (unless actually needed)
   - standalone is a PROPERTY, not an import!

   CORRECT COMPONENT STRUCTURE:
   - Use standalone: true as a PROPERTY in @Component decorator
   - DO NOT mix standalone with @NgModule - choose one or the other
   - For this project: ALWAYS use standalone components

   METHODS & PROPERTIES:
   - If HTML has (click)="methodName()" -> TypeScript MUST have methodName() {{}}
   - If HTML has {{{{propertyName}}}} -> TypeScript MUST have propertyName property
   - Include ALL properties and methods referenced in HTML template

2. HTML Template (.html):
   - ONLY use approved CSS classes from the list above
   - For ANY style not in approved list: use [style] attribute
   - Use Angular property binding: [style], [class]

3. SCSS Styles (.scss):
   - Should be MINIMAL or EMPTY (use global brand classes)

Format your response EXACTLY like this:

{SCRIPT_FENCE}
// TypeScript code here
// EXAMPLE CORRECT STRUCTURE:
// import {{ Component }} from '@angular/core';
// import {{ CommonModule }} from '@angular/common';
//
// @Component({{
//   selector: 'app-{name}',
//   standalone: true,
//   imports: [CommonModule],
//   templateUrl: './{name}.component.html',
//   styleUrls: ['./{name}.component.scss']
// }})
// export class {class_name} {{
//   // Include ALL methods used in template
//   onClick(): void {{
//     console.log('clicked');
//   }}
// }}
```

{MARKUP_FENCE}
<!-- HTML template here -->
```

{STYLESHEET_FENCE}
/* SCSS styles here */
```

Generate clean, production-ready code now."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component() -> ComponentName {
        ComponentName::parse("hero-banner").unwrap()
    }

    #[test]
    fn test_small_design_not_truncated() {
        let node = DesignNode::new(json!({"id": "10:20", "type": "FRAME"}));
        let text = truncated_design(&node);
        assert!(!text.ends_with("..."));
        assert_eq!(text, node.to_pretty_json());
    }

    #[test]
    fn test_large_design_truncated_to_budget() {
        let children: Vec<_> = (0..500)
            .map(|i| json!({"id": format!("1:{}", i), "type": "TEXT", "characters": "lorem ipsum"}))
            .collect();
        let node = DesignNode::new(json!({"id": "1:0", "children": children}));

        let text = truncated_design(&node);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), DESIGN_CHAR_BUDGET + 3);
    }

    #[test]
    fn test_prompt_contains_inputs_and_contract() {
        let node = DesignNode::new(json!({"id": "10:20", "type": "FRAME", "name": "Hero"}));
        let styles = BrandStyleSet::from_css(".card {} .btn-primary {}");
        let prompt = build_prompt(&node, &styles, &component());

        assert!(prompt.contains("ONLY USE THESE 2 CLASSES:\nbtn-primary, card\n"));
        assert!(prompt.contains("\"name\": \"Hero\""));
        assert!(prompt.contains("COMPONENT NAME: hero-banner"));
        assert!(prompt.contains("export class HeroBannerComponent {"));
        assert!(prompt.contains("selector: 'app-hero-banner'"));
        assert!(prompt.contains("If HTML has {{propertyName}}"));
        assert!(prompt.contains("```typescript\n"));
        assert!(prompt.contains("```html\n<!-- HTML template here -->\n```"));
        assert!(prompt.contains("```scss\n/* SCSS styles here */\n```"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let node = DesignNode::new(json!({"id": "10:20"}));
        let styles = BrandStyleSet::from_css(".z {} .a {} .m {}");
        assert_eq!(
            build_prompt(&node, &styles, &component()),
            build_prompt(&node, &styles, &component())
        );
    }
}
