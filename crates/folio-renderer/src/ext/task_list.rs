//! GitHub task lists: list items starting `[ ] ` or `[x] ` become checkbox
//! items.

use crate::ast::{Block, BlockContent, BlockKind, Document};
use crate::error::RenderError;
use crate::extension::{DocumentTransform, Extension, ParseRule, RenderRule, TransformPhase};
use crate::renderer::RenderContext;

use super::core::render::list_item_body;

/// The `task-list` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskListExtension;

impl Extension for TaskListExtension {
    fn name(&self) -> &str {
        "task-list"
    }

    fn parsing_rules(&self) -> Vec<ParseRule> {
        vec![ParseRule::transform(DetectTasks)]
    }

    fn rendering_rules(&self) -> Vec<RenderRule> {
        vec![RenderRule::block(BlockKind::TaskItem, render_task_item)]
    }
}

/// Split a task marker off the start of an item's text.
fn task_marker(text: &str) -> Option<(bool, &str)> {
    let (checked, rest) = if let Some(rest) = text.strip_prefix("[ ]") {
        (false, rest)
    } else if let Some(rest) = text.strip_prefix("[x]").or_else(|| text.strip_prefix("[X]")) {
        (true, rest)
    } else {
        return None;
    };
    if rest.is_empty() {
        return Some((checked, rest));
    }
    rest.strip_prefix([' ', '\t']).map(|rest| (checked, rest))
}

struct DetectTasks;

impl DocumentTransform for DetectTasks {
    fn phase(&self) -> TransformPhase {
        TransformPhase::BeforeInline
    }

    fn apply(&self, document: &mut Document) {
        document.walk_blocks_mut(&mut |block| {
            if block.kind != BlockKind::ListItem {
                return;
            }
            let Some(first) = block
                .children_mut()
                .and_then(|children| children.first_mut())
                .filter(|first| first.kind == BlockKind::Paragraph)
            else {
                return;
            };
            let BlockContent::Raw(text) = &mut first.content else {
                return;
            };
            let Some((checked, rest)) = task_marker(text) else {
                return;
            };
            *text = rest.to_owned();
            block.kind = BlockKind::TaskItem;
            block.attrs.insert("checked", checked.to_string());
        });
    }
}

fn render_task_item(block: &Block, cx: &mut RenderContext<'_>) -> Result<(), RenderError> {
    cx.push_str(
        "<li class=\"task-list-item\">\
         <input type=\"checkbox\" class=\"task-list-item-checkbox\" disabled=\"disabled\"",
    );
    if block.attrs.flag("checked") {
        cx.push_str(" checked=\"checked\"");
    }
    cx.push_str(" />");
    if block.attrs.flag("tight") {
        cx.push_str(" ");
    }
    list_item_body(block, cx)?;
    cx.push_str("</li>\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ext::CoreSyntax;
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::registry::Registry;

    fn render(input: &str) -> String {
        let registry = Registry::builder()
            .with_extension(TaskListExtension)
            .with_extension(CoreSyntax)
            .build()
            .unwrap();
        Pipeline::new(Arc::new(registry), PipelineOptions::default())
            .render_document(input)
            .unwrap()
            .html
    }

    #[test]
    fn test_task_marker() {
        assert_eq!(task_marker("[ ] todo"), Some((false, "todo")));
        assert_eq!(task_marker("[X] done"), Some((true, "done")));
        assert_eq!(task_marker("[x]"), Some((true, "")));
        assert_eq!(task_marker("[x]y"), None);
        assert_eq!(task_marker("[link](/x)"), None);
    }

    #[test]
    fn test_task_items() {
        assert_eq!(
            render("- [ ] todo\n- [x] *done*\n- plain"),
            "<ul>\n\
             <li class=\"task-list-item\">\
             <input type=\"checkbox\" class=\"task-list-item-checkbox\" disabled=\"disabled\" />\
             \x20todo</li>\n\
             <li class=\"task-list-item\">\
             <input type=\"checkbox\" class=\"task-list-item-checkbox\" disabled=\"disabled\" \
             checked=\"checked\" /> <em>done</em></li>\n\
             <li>plain</li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn test_marker_outside_list_is_text() {
        assert_eq!(render("[ ] not a task"), "<p>[ ] not a task</p>\n");
    }
}
