//! Main conversion coordinator for flowdoc
//!
//! This module ties the pipeline together:
//! - Source parsing via deno_ast/SWC
//! - Collecting function-like nodes with their comments
//! - Running the annotator and applying its edits

use crate::annotator::Annotator;
use crate::comment::Comment;
use crate::config::ConvertConfig;
use crate::diagnostics::FlowdocResult;
use crate::edits::{apply_edits, AnnotationEdit};
use crate::function::{FunctionKind, FunctionLike};
use crate::params::{ParamPattern, PropPattern, SourceRange};
use crate::utils::swc::{parse_file, parse_source, prop_name_str, ParsedModule};
use deno_ast::swc::ast as swc_ast;
use deno_ast::swc::common::{BytePos, Spanned};
use deno_ast::swc::ecma_visit::{Visit, VisitWith};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of converting one source text
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub path: PathBuf,
    /// Annotated source
    #[serde(skip)]
    pub output: String,
    /// Edits applied to the original text
    pub edits: Vec<AnnotationEdit>,
    /// Function-like nodes found
    pub functions: usize,
    /// Function-like nodes that received at least one edit
    pub annotated_functions: usize,
}

impl Conversion {
    /// Whether the output differs from the input
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Convert JavaScript source text
///
/// The path picks the dialect (by extension) and is used in reports; the
/// file itself is not read.
pub fn convert_source(
    path: impl AsRef<Path>,
    source: &str,
    config: &ConvertConfig,
) -> FlowdocResult<Conversion> {
    let parsed = parse_source(path, source)?;
    Ok(convert_parsed(&parsed, config))
}

/// Read and convert a file, without writing it back
pub fn convert_file(path: impl AsRef<Path>, config: &ConvertConfig) -> FlowdocResult<Conversion> {
    let parsed = parse_file(path)?;
    Ok(convert_parsed(&parsed, config))
}

fn convert_parsed(parsed: &ParsedModule, config: &ConvertConfig) -> Conversion {
    let functions = collect_functions(parsed);
    let mut annotator = Annotator::new().with_returns(config.returns);

    let mut edits = Vec::new();
    let mut annotated_functions = 0;
    for function in &functions {
        let function_edits = annotator.annotate(function);
        if !function_edits.is_empty() {
            tracing::debug!(
                function = %function.display_name(),
                edits = function_edits.len(),
                "annotated"
            );
            annotated_functions += 1;
            edits.extend(function_edits);
        }
    }

    Conversion {
        path: parsed.path().to_path_buf(),
        output: apply_edits(parsed.source_text(), &edits),
        edits,
        functions: functions.len(),
        annotated_functions,
    }
}

/// Collect every function-like node in source order (outer before inner)
pub fn collect_functions(parsed: &ParsedModule) -> Vec<FunctionLike> {
    let mut collector = FunctionCollector::new(parsed);
    match parsed.program_ref() {
        deno_ast::ProgramRef::Module(module) => module.visit_with(&mut collector),
        deno_ast::ProgramRef::Script(script) => script.visit_with(&mut collector),
    }
    collector.functions
}

/// Walks the tree, tracking the hosts whose comments belong to the next
/// function-like node
struct FunctionCollector<'a> {
    parsed: &'a ParsedModule,
    /// Starts of enclosing statements, declarators, properties and members
    /// within the current function scope
    anchors: Vec<BytePos>,
    /// Anchors outside each enclosing class body, used by constructors
    class_anchors: Vec<Vec<BytePos>>,
    /// Name given by a declarator or property for the next function
    host_name: Option<String>,
    functions: Vec<FunctionLike>,
}

impl<'a> FunctionCollector<'a> {
    fn new(parsed: &'a ParsedModule) -> Self {
        Self {
            parsed,
            anchors: Vec::new(),
            class_anchors: Vec::new(),
            host_name: None,
            functions: Vec::new(),
        }
    }

    fn text(&self) -> &str {
        self.parsed.source_text()
    }

    /// Visit with an extra anchor in scope
    fn anchored(&mut self, lo: BytePos, visit: impl FnOnce(&mut Self)) {
        self.anchors.push(lo);
        visit(self);
        self.anchors.pop();
    }

    /// Visit a function body with a fresh anchor scope
    fn scoped(&mut self, visit: impl FnOnce(&mut Self)) {
        let outer = std::mem::take(&mut self.anchors);
        let host = self.host_name.take();
        visit(self);
        self.anchors = outer;
        self.host_name = host;
    }

    /// Leading comments at every anchor in scope plus the node's own start
    fn comments_for(&self, lo: BytePos, extra: &[BytePos]) -> Vec<Comment> {
        extra
            .iter()
            .chain(self.anchors.iter())
            .chain(std::iter::once(&lo))
            .flat_map(|pos| self.parsed.leading_comments(*pos))
            .collect()
    }

    fn record(&mut self, function: FunctionLike) {
        tracing::trace!(
            function = %function.display_name(),
            comments = function.comments.len(),
            "found function"
        );
        self.functions.push(function);
    }

    /// Record a `Function` node and visit its children
    fn enter_function(&mut self, function: &swc_ast::Function, kind: FunctionKind, name: Option<String>) {
        let range = self.parsed.range(function.span);
        let params: Vec<ParamPattern> = function.params.iter().map(|p| self.pattern(&p.pat)).collect();
        let params_end = function.params.last().map(|p| self.parsed.byte_index(p.span.hi));

        let mut node = FunctionLike::new(kind, range)
            .with_params(params)
            .with_comments(self.comments_for(function.span.lo, &[]));
        if let Some(name) = name.or_else(|| self.host_name.take()) {
            node = node.with_name(name);
        }
        if let Some(close) = find_params_close(self.text(), range.start, params_end) {
            node = node.with_return_offset(close + 1);
        }
        if function.return_type.is_some() {
            node = node.with_return_type();
        }
        self.record(node);

        self.scoped(|this| function.visit_children_with(this));
    }

    fn pattern(&self, pat: &swc_ast::Pat) -> ParamPattern {
        match pat {
            swc_ast::Pat::Ident(i) => {
                let mut range = self.parsed.range(i.id.span);
                if i.optional {
                    // `a?` keeps the marker before the annotation
                    range.end += 1;
                }
                ParamPattern::Ident {
                    name: i.sym.to_string(),
                    range,
                    annotated: i.type_ann.is_some(),
                }
            }
            swc_ast::Pat::Object(o) => ParamPattern::Object {
                props: o.props.iter().filter_map(|p| self.prop_pattern(p)).collect(),
                range: self.pattern_range(o.span, o.type_ann.as_deref()),
                annotated: o.type_ann.is_some(),
            },
            swc_ast::Pat::Array(a) => ParamPattern::Array {
                range: self.pattern_range(a.span, a.type_ann.as_deref()),
                annotated: a.type_ann.is_some(),
            },
            swc_ast::Pat::Assign(a) => ParamPattern::Assign {
                left: Box::new(self.pattern(&a.left)),
                range: self.parsed.range(a.span),
            },
            swc_ast::Pat::Rest(r) => ParamPattern::Rest {
                arg: Box::new(self.pattern(&r.arg)),
                range: self.parsed.range(r.span),
                annotated: r.type_ann.is_some(),
            },
            swc_ast::Pat::Expr(_) | swc_ast::Pat::Invalid(_) => ParamPattern::Other {
                range: self.parsed.range(pat.span()),
            },
        }
    }

    /// Range of a destructuring pattern without its type annotation
    fn pattern_range(
        &self,
        span: deno_ast::swc::common::Span,
        type_ann: Option<&swc_ast::TsTypeAnn>,
    ) -> SourceRange {
        let mut range = self.parsed.range(span);
        if let Some(ann) = type_ann {
            range.end = range.end.min(self.parsed.byte_index(ann.span.lo));
        }
        range
    }

    fn prop_pattern(&self, prop: &swc_ast::ObjectPatProp) -> Option<PropPattern> {
        match prop {
            swc_ast::ObjectPatProp::Assign(a) => Some(PropPattern {
                key: a.key.sym.to_string(),
                value: None,
                has_default: a.value.is_some(),
            }),
            swc_ast::ObjectPatProp::KeyValue(kv) => Some(PropPattern {
                key: prop_name_str(&kv.key)?,
                has_default: matches!(kv.value.as_ref(), swc_ast::Pat::Assign(_)),
                value: Some(self.pattern(&kv.value)),
            }),
            swc_ast::ObjectPatProp::Rest(_) => None,
        }
    }
}

impl Visit for FunctionCollector<'_> {
    fn visit_module_item(&mut self, item: &swc_ast::ModuleItem) {
        self.anchored(item.span().lo, |this| item.visit_children_with(this));
    }

    fn visit_stmt(&mut self, stmt: &swc_ast::Stmt) {
        self.anchored(stmt.span().lo, |this| stmt.visit_children_with(this));
    }

    fn visit_var_declarator(&mut self, declarator: &swc_ast::VarDeclarator) {
        if let (swc_ast::Pat::Ident(name), Some(init)) = (&declarator.name, &declarator.init) {
            if matches!(init.as_ref(), swc_ast::Expr::Fn(_) | swc_ast::Expr::Arrow(_)) {
                self.host_name = Some(name.sym.to_string());
            }
        }
        self.anchored(declarator.span.lo, |this| declarator.visit_children_with(this));
    }

    fn visit_prop(&mut self, prop: &swc_ast::Prop) {
        if let swc_ast::Prop::KeyValue(kv) = prop {
            if matches!(kv.value.as_ref(), swc_ast::Expr::Fn(_) | swc_ast::Expr::Arrow(_)) {
                self.host_name = prop_name_str(&kv.key);
            }
        }
        self.anchored(prop.span().lo, |this| prop.visit_children_with(this));
    }

    fn visit_class(&mut self, class: &swc_ast::Class) {
        let outer = std::mem::take(&mut self.anchors);
        self.class_anchors.push(outer.clone());
        class.visit_children_with(self);
        self.class_anchors.pop();
        self.anchors = outer;
    }

    fn visit_class_member(&mut self, member: &swc_ast::ClassMember) {
        self.anchored(member.span().lo, |this| member.visit_children_with(this));
    }

    fn visit_fn_decl(&mut self, decl: &swc_ast::FnDecl) {
        self.host_name = Some(decl.ident.sym.to_string());
        decl.visit_children_with(self);
    }

    fn visit_fn_expr(&mut self, expr: &swc_ast::FnExpr) {
        if let Some(ident) = &expr.ident {
            self.host_name = Some(ident.sym.to_string());
        }
        expr.visit_children_with(self);
    }

    fn visit_function(&mut self, function: &swc_ast::Function) {
        self.enter_function(function, FunctionKind::Function, None);
    }

    fn visit_class_method(&mut self, method: &swc_ast::ClassMethod) {
        method.key.visit_with(self);
        let kind = method_kind(method.kind);
        self.enter_function(&method.function, kind, prop_name_str(&method.key));
    }

    fn visit_private_method(&mut self, method: &swc_ast::PrivateMethod) {
        let kind = method_kind(method.kind);
        let name = format!("#{}", method.key.name);
        self.enter_function(&method.function, kind, Some(name));
    }

    fn visit_method_prop(&mut self, method: &swc_ast::MethodProp) {
        method.key.visit_with(self);
        self.enter_function(&method.function, FunctionKind::Method, prop_name_str(&method.key));
    }

    fn visit_constructor(&mut self, ctor: &swc_ast::Constructor) {
        let range = self.parsed.range(ctor.span);
        let params = ctor
            .params
            .iter()
            .map(|p| match p {
                swc_ast::ParamOrTsParamProp::Param(param) => self.pattern(&param.pat),
                swc_ast::ParamOrTsParamProp::TsParamProp(prop) => ParamPattern::Other {
                    range: self.parsed.range(prop.span),
                },
            })
            .collect();
        // a class comment documents the constructor too
        let class_anchors = self.class_anchors.last().cloned().unwrap_or_default();
        let node = FunctionLike::new(FunctionKind::Constructor, range)
            .with_name("constructor")
            .with_params(params)
            .with_comments(self.comments_for(ctor.span.lo, &class_anchors));
        self.record(node);

        self.scoped(|this| ctor.visit_children_with(this));
    }

    fn visit_arrow_expr(&mut self, arrow: &swc_ast::ArrowExpr) {
        let range = self.parsed.range(arrow.span);
        let params: Vec<ParamPattern> = arrow.params.iter().map(|p| self.pattern(p)).collect();

        let bare = match arrow.params.as_slice() {
            [only] => {
                let param_start = self.parsed.byte_index(only.span().lo);
                !self
                    .text()
                    .get(range.start..param_start)
                    .unwrap_or_default()
                    .contains('(')
            }
            _ => false,
        };

        let mut node = FunctionLike::new(FunctionKind::Arrow, range)
            .with_comments(self.comments_for(arrow.span.lo, &[]));
        if let Some(name) = self.host_name.take() {
            node = node.with_name(name);
        }
        if bare {
            node = node.with_return_offset(params[0].range().end).as_bare_arrow();
        } else {
            let params_end = arrow.params.last().map(|p| self.parsed.byte_index(p.span().hi));
            if let Some(close) = find_params_close(self.text(), range.start, params_end) {
                node = node.with_return_offset(close + 1);
            }
        }
        if arrow.return_type.is_some() {
            node = node.with_return_type();
        }
        self.record(node.with_params(params));

        self.scoped(|this| arrow.visit_children_with(this));
    }
}

fn method_kind(kind: swc_ast::MethodKind) -> FunctionKind {
    match kind {
        swc_ast::MethodKind::Method => FunctionKind::Method,
        swc_ast::MethodKind::Getter => FunctionKind::Getter,
        swc_ast::MethodKind::Setter => FunctionKind::Setter,
    }
}

/// Offset of the `)` closing a parameter list
///
/// Scans from the end of the last parameter, or from the first `(` after
/// `start` when there are no parameters, skipping whitespace, commas and
/// comments.
fn find_params_close(text: &str, start: usize, params_end: Option<usize>) -> Option<usize> {
    let from = match params_end {
        Some(end) => end,
        None => start + text.get(start..)?.find('(')? + 1,
    };

    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b')' => return Some(i),
            b',' | b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2 + text.get(i + 2..)?.find("*/")? + 2;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i += text.get(i..)?.find('\n').unwrap_or(bytes.len() - i);
            }
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn functions(source: &str) -> Vec<FunctionLike> {
        // deno_ast requires absolute paths for file specifiers
        let parsed = parse_source("/tmp/test.js", source).unwrap();
        collect_functions(&parsed)
    }

    #[test]
    fn test_find_params_close() {
        let text = "function f(a, b /* x */ ) {}";
        assert_eq!(find_params_close(text, 0, Some(15)), Some(24));
        assert_eq!(find_params_close("function f() {}", 0, None), Some(11));
        assert_eq!(find_params_close("function f(a: number) {}", 0, Some(12)), None);
    }

    #[test]
    fn test_collect_function_declaration() {
        let source = "/** @param {number} a */\nfunction test(a, b = 1) {}\n";
        let found = functions(source);
        assert_eq!(found.len(), 1);

        let function = &found[0];
        assert_eq!(function.kind, FunctionKind::Function);
        assert_eq!(function.name.as_deref(), Some("test"));
        assert_eq!(function.comments.len(), 1);
        assert_eq!(function.params.len(), 2);
        assert_eq!(function.params[0].annotation_offset(), 40);
        assert!(function.params[1].has_default());
        assert_eq!(function.return_offset, Some(48));
    }

    #[test]
    fn test_collect_nested_in_order() {
        let source = "function outer(a) {\n  const inner = (b) => b;\n  return inner;\n}\n";
        let found = functions(source);
        let names: Vec<_> = found.iter().map(|f| f.name.as_deref()).collect();
        assert_eq!(names, vec![Some("outer"), Some("inner")]);
        assert_eq!(found[1].kind, FunctionKind::Arrow);
        assert!(!found[1].bare_arrow_param);
    }

    #[test]
    fn test_comments_from_hosts() {
        let source = r#"
/** @param {number} a */
export const add = (a) => a + 1;

const obj = {
  /** @param {string} s */
  method(s) {},
};

class A {
  /** @param {number} x */
  constructor(x) {}

  /** @param {number} y */
  set value(y) {}
}
"#;
        let found = functions(source);
        assert_eq!(found.len(), 4);
        assert!(found.iter().all(|f| f.comments.len() == 1));
        assert_eq!(found[0].name.as_deref(), Some("add"));
        assert_eq!(found[1].kind, FunctionKind::Method);
        assert_eq!(found[2].kind, FunctionKind::Constructor);
        assert_eq!(found[3].kind, FunctionKind::Setter);
    }

    #[test]
    fn test_class_comment_reaches_constructor_only() {
        let source = r#"
/** @param {number} x */
class A {
  constructor(x) {}
  method(x) {}
}
"#;
        let found = functions(source);
        assert_eq!(found[0].kind, FunctionKind::Constructor);
        assert_eq!(found[0].comments.len(), 1);
        assert!(found[1].comments.is_empty());
    }

    #[test]
    fn test_bare_arrow() {
        let source = "const f = a => a;\nconst g = async b => b;\n";
        let found = functions(source);
        assert!(found.iter().all(|f| f.bare_arrow_param));
        assert_eq!(found[0].return_offset, Some(11));
    }

    #[test]
    fn test_destructured_patterns() {
        let source = "function f({ a = 1, b: { c } }, [d], ...rest) {}";
        let found = functions(source);
        let params = &found[0].params;

        let ParamPattern::Object { props, .. } = &params[0] else {
            panic!("expected an object pattern");
        };
        assert_eq!(props[0].key, "a");
        assert!(props[0].has_default);
        assert_eq!(props[1].key, "b");
        assert!(props[1].pattern().unwrap().property("c").is_some());
        assert_eq!(params[0].annotation_offset(), 30);

        assert!(matches!(params[1], ParamPattern::Array { .. }));
        assert!(params[2].is_rest());
        assert_eq!(params[2].identifier(), Some("rest"));
    }

    #[test]
    fn test_convert_source_counts() {
        let source = "/** @param {number} a */\nfunction test(a) {}\nfunction other(b) {}\n";
        let conversion = convert_source("/tmp/test.js", source, &ConvertConfig::default()).unwrap();
        assert_eq!(conversion.functions, 2);
        assert_eq!(conversion.annotated_functions, 1);
        assert!(conversion.changed());
        assert_eq!(
            conversion.output,
            "/** @param {number} a */\nfunction test(a: number) {}\nfunction other(b) {}\n"
        );
    }
}
