//! Flow type rendering
//!
//! Turns documented types into Flow annotation text. Two optional notations
//! are kept apart: a direct parameter documented `{T=}` becomes `?T`, while a
//! documented property becomes `name?: ?T` (or `name?: T` when the
//! destructuring pattern gives it a default). Object-like nodes never get the
//! `?` prefix.

use crate::doctype::{DocType, FunctionParam, FunctionType, RecordField};
use crate::params::ParamPattern;
use crate::reconcile::Tag;
use crate::type_tree::TypeTreeNode;

/// Render a structured type
pub fn render_type(ty: &DocType) -> String {
    match ty {
        DocType::All | DocType::Unknown => "any".to_string(),
        DocType::Null => "null".to_string(),
        DocType::Undefined | DocType::Void => "void".to_string(),
        DocType::Name { name } if name == "object" => "{}".to_string(),
        DocType::Name { name } => name.clone(),
        DocType::Literal { value } => value.clone(),
        DocType::Nullable { inner } => nullable(render_type(inner), Some(inner)),
        DocType::NonNullable { inner } | DocType::Optional { inner } => render_type(inner),
        DocType::Rest { inner } => format!("Array<{}>", render_type(inner)),
        DocType::Union { members } => members
            .iter()
            .map(render_union_member)
            .collect::<Vec<_>>()
            .join(" | "),
        DocType::Application { base, args } => {
            let args = args.iter().map(render_type).collect::<Vec<_>>().join(", ");
            if ty.is_array() {
                format!("Array<{args}>")
            } else {
                format!("{}<{}>", render_type(base), args)
            }
        }
        DocType::Function(function) => render_function(function),
        DocType::Record { fields } => render_record(fields),
        DocType::Tuple { elements } => format!(
            "[{}]",
            elements.iter().map(render_type).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn render_union_member(ty: &DocType) -> String {
    match ty {
        DocType::Function(_) => format!("({})", render_type(ty)),
        other => render_type(other),
    }
}

fn render_function(function: &FunctionType) -> String {
    let params = function
        .params
        .iter()
        .map(render_function_param)
        .collect::<Vec<_>>()
        .join(",");
    let result = function
        .result
        .as_ref()
        .or(function.new.as_ref())
        .map(render_type)
        .unwrap_or_else(|| "void".to_string());
    format!("({params}) => {result}")
}

fn render_function_param(param: &FunctionParam) -> String {
    let (prefix, marker) = match &param.ty {
        DocType::Rest { .. } => ("...", ""),
        DocType::Optional { .. } => ("", "?"),
        _ => ("", ""),
    };
    let ty = render_type(&param.ty);
    match &param.name {
        Some(name) => format!("{prefix}{name}{marker}:{ty}"),
        None => format!("{prefix}{ty}"),
    }
}

fn render_record(fields: &[RecordField]) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let fields = fields
        .iter()
        .map(|field| match &field.ty {
            Some(ty @ DocType::Optional { .. }) => {
                format!("{}?: {}", field.key, render_type(ty))
            }
            Some(ty) => format!("{}: {}", field.key, render_type(ty)),
            None => format!("{}: any", field.key),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {fields} }}")
}

/// Prefix with `?`, parenthesizing types that would otherwise bind wrongly
fn nullable(rendered: String, ty: Option<&DocType>) -> String {
    if rendered.starts_with('?') {
        return rendered;
    }
    let needs_parens = match ty.map(DocType::without_optional) {
        Some(DocType::Union { members }) => members.len() > 1,
        Some(DocType::Function(_)) => true,
        Some(_) => false,
        None => rendered.contains(" | ") || rendered.contains("=>"),
    };
    if needs_parens {
        format!("?({rendered})")
    } else {
        format!("?{rendered}")
    }
}

/// Raw type text passed through, without a trailing `=`
fn raw_type_text(text: &str) -> Option<String> {
    let text = text.trim();
    let text = text.strip_suffix('=').unwrap_or(text).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Annotation for a direct parameter
///
/// Returns `None` when nothing renderable was documented.
pub fn render_param(node: &TypeTreeNode, pattern: &ParamPattern) -> Option<String> {
    let rendered = render_node(node, Some(pattern.base()))?;

    if pattern.is_rest() {
        return Some(rest_array(node, rendered));
    }

    if node.optional && !node.is_object_like() {
        Some(nullable(rendered, node.doc_type.as_ref()))
    } else {
        Some(rendered)
    }
}

/// Annotation for a `@returns` tag
pub fn render_returns(tag: &Tag) -> Option<String> {
    match &tag.doc_type {
        Some(ty) => Some(render_type(ty.without_optional())),
        None => raw_type_text(&tag.type_text),
    }
}

/// Wrap a rest parameter's type in `Array<...>` unless it already is one
fn rest_array(node: &TypeTreeNode, rendered: String) -> String {
    let already_array = match node.doc_type.as_ref().map(DocType::without_optional) {
        Some(DocType::Rest { .. }) => true,
        Some(ty) => ty.is_array(),
        None => {
            let raw = node.type_text.as_deref().unwrap_or_default().trim();
            if let Some(element) = raw.strip_prefix("...") {
                return format!("Array<{}>", element.trim());
            }
            rendered.ends_with("[]") || rendered.starts_with("Array")
        }
    };
    if already_array {
        rendered
    } else {
        format!("Array<{rendered}>")
    }
}

/// Value part of a node: object literal, structured type or raw text
fn render_node(node: &TypeTreeNode, pattern: Option<&ParamPattern>) -> Option<String> {
    if !node.children.is_empty() {
        return Some(render_properties(node, pattern));
    }
    match &node.doc_type {
        Some(ty) => Some(render_type(ty.without_optional())),
        None => node.type_text.as_deref().and_then(raw_type_text),
    }
}

fn render_properties(node: &TypeTreeNode, pattern: Option<&ParamPattern>) -> String {
    let props = node
        .children
        .values()
        .map(|child| {
            let prop = pattern.and_then(|p| p.property(&child.name));
            let has_default = prop.is_some_and(|p| p.has_default);
            let nested = prop.and_then(|p| p.pattern());

            let value = render_node(child, nested).unwrap_or_else(|| "any".to_string());
            let key = property_key(&child.name);
            if !child.optional {
                format!("{key}: {value}")
            } else if child.is_object_like() || has_default {
                format!("{key}?: {value}")
            } else {
                format!("{key}?: {}", nullable(value, child.doc_type.as_ref()))
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {props} }}")
}

/// Quote keys that are not plain identifiers
fn property_key(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        format!("'{name}'")
    }
}
