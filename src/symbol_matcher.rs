//! Correlates runtime callables with their source declarations.
//!
//! Declarations are collected from a parsed file with a [`syn`] visitor: free functions,
//! functions inside inherent and trait `impl` blocks, and everything inside inline
//! modules. Selection then works on plain [`Declaration`] values, so manifest-backed
//! providers share the same disambiguation rules.

use crate::docs_provider::{Declaration, Field, LineSpan};
use crate::parser::ParsedSource;
use log::debug;
use quote::ToTokens;
use regex::Regex;
use syn::visit::Visit;

/// Stable name of a runtime path: generic arguments stripped, last `::` segment kept.
///
/// `my_node::api::EthApi::balance` and `<my_node::EthApi as my_node::Eth>::balance`
/// both yield `balance`.
pub fn stable_name(path: &str) -> String {
    let mut depth = 0usize;
    let mut stripped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }
    stripped
        .rsplit("::")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Collects every function declaration of a parsed file, in source order
pub fn collect_declarations(parsed: &ParsedSource) -> Vec<Declaration> {
    let mut visitor = DeclarationVisitor {
        parsed,
        declarations: Vec::new(),
    };
    visitor.visit_file(&parsed.syntax_tree);
    debug!(
        "Collected {} declarations from {}",
        visitor.declarations.len(),
        parsed.path.display()
    );
    visitor.declarations
}

/// Picks the declaration for `symbol`.
///
/// With a receiver, a candidate matches when its receiver type name, as a whole word,
/// occurs in the receiver's printed form. Candidates without a receiver never match a
/// bound callable. Without a receiver the first candidate with that name wins.
pub fn select<'a>(
    candidates: &'a [Declaration],
    symbol: &str,
    receiver: Option<&str>,
) -> Option<&'a Declaration> {
    candidates
        .iter()
        .filter(|candidate| candidate.name == symbol)
        .find(|candidate| match receiver {
            None => true,
            Some(printed) => candidate
                .receiver
                .as_deref()
                .and_then(receiver_pattern)
                .map(|pattern| pattern.is_match(printed))
                .unwrap_or(false),
        })
}

fn receiver_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).ok()
}

struct DeclarationVisitor<'a> {
    parsed: &'a ParsedSource,
    declarations: Vec<Declaration>,
}

impl DeclarationVisitor<'_> {
    fn push(
        &mut self,
        attrs: &[syn::Attribute],
        sig: &syn::Signature,
        block: &syn::Block,
        receiver: Option<String>,
    ) {
        let span = LineSpan {
            start: sig.fn_token.span.start().line,
            end: block.brace_token.span.close().end().line,
        };
        let params = sig
            .inputs
            .iter()
            .filter_map(|arg| match arg {
                syn::FnArg::Receiver(_) => None,
                syn::FnArg::Typed(pat_type) => Some(Field {
                    names: binding_names(&pat_type.pat),
                    ty: type_text(&pat_type.ty),
                    comment: doc_text(&pat_type.attrs),
                    error: false,
                }),
            })
            .collect();
        let results = match &sig.output {
            syn::ReturnType::Default => Vec::new(),
            syn::ReturnType::Type(_, ty) => result_fields(ty),
        };

        self.declarations.push(Declaration {
            name: sig.ident.to_string(),
            receiver,
            doc: doc_text(attrs).unwrap_or_default(),
            params,
            results,
            deprecated: attrs.iter().any(|a| a.path().is_ident("deprecated")),
            file: self.parsed.path.clone(),
            span,
            source: self.parsed.lines(span),
        });
    }
}

impl<'ast> Visit<'ast> for DeclarationVisitor<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.push(&node.attrs, &node.sig, &node.block, None);
    }

    fn visit_item_impl(&mut self, node: &'ast syn::ItemImpl) {
        let receiver = self_type_name(&node.self_ty);
        for item in &node.items {
            if let syn::ImplItem::Fn(f) = item {
                self.push(&f.attrs, &f.sig, &f.block, receiver.clone());
            }
        }
    }
}

/// Last path segment of an `impl` self type
fn self_type_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        syn::Type::Reference(r) => self_type_name(&r.elem),
        syn::Type::Paren(p) => self_type_name(&p.elem),
        syn::Type::Group(g) => self_type_name(&g.elem),
        _ => None,
    }
}

fn binding_names(pat: &syn::Pat) -> Vec<String> {
    match pat {
        syn::Pat::Ident(ident) => vec![ident.ident.to_string()],
        syn::Pat::Type(inner) => binding_names(&inner.pat),
        _ => Vec::new(),
    }
}

/// `///` lines joined with newlines, one leading space stripped from each
fn doc_text(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').map(str::to_string).unwrap_or(line))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Printed form of a type with token spacing collapsed, e.g. `Option<Vec<u8>>`
pub fn type_text(ty: &syn::Type) -> String {
    let text = ty.to_token_stream().to_string();
    text.replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

/// A single return slot, marked as an error when its type names an error
fn slot_field(ty: &syn::Type) -> Field {
    Field {
        error: is_error_type(ty),
        ..Field::typed(type_text(ty))
    }
}

/// Whether the last path segment ends in `Error`, e.g. `io::Error` or `RpcError`
fn is_error_type(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(p) => p
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident.to_string().ends_with("Error")),
        syn::Type::Reference(r) => is_error_type(&r.elem),
        syn::Type::Paren(p) => is_error_type(&p.elem),
        syn::Type::Group(g) => is_error_type(&g.elem),
        _ => false,
    }
}

fn result_fields(ty: &syn::Type) -> Vec<Field> {
    match ty {
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => Vec::new(),
        syn::Type::Tuple(tuple) => tuple.elems.iter().map(slot_field).collect(),
        syn::Type::Paren(inner) => result_fields(&inner.elem),
        syn::Type::Path(p) => {
            let Some(last) = p.path.segments.last() else {
                return vec![Field::typed(type_text(ty))];
            };
            if last.ident != "Result" {
                return vec![slot_field(ty)];
            }
            let syn::PathArguments::AngleBracketed(args) = &last.arguments else {
                return vec![Field::typed(type_text(ty))];
            };
            let mut types = args.args.iter().filter_map(|arg| match arg {
                syn::GenericArgument::Type(t) => Some(t),
                _ => None,
            });

            let mut fields = types.next().map(result_fields).unwrap_or_default();
            let error_ty = types
                .next()
                .map(type_text)
                .unwrap_or_else(|| "Error".to_string());
            fields.push(Field {
                error: true,
                ..Field::typed(error_ty)
            });
            fields
        }
        _ => vec![slot_field(ty)],
    }
}
