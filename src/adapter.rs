//! Lowers parsed syntax trees into the declaration graph.
//!
//! Contract sources are ordinary Rust items carrying contract attributes:
//! traits become interfaces, structs become classes, enums become enum
//! types. `#[extends("Base")]` and `#[implements("A", "B")]` wire structural
//! relations that Rust itself does not express; trait supertraits are picked
//! up directly. Inherent impl blocks contribute methods, constructors and
//! `get_x`/`set_x` accessor pairs to the type they implement.

use std::collections::BTreeMap;

use log::{debug, warn};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Token, TraitBound, TypeParamBound};

use crate::declaration::{
    Annotation, BindingStyle, ConstructorDecl, DeclarationGraph, FieldDecl, MethodDecl,
    PackageDecl, ParamDecl, ParameterStyle, Position, PropertyDecl, TypeDecl, TypeKind, TypeRef,
};
use crate::parser::ParsedFile;

/// Accumulates declarations across files and resolves impl blocks against
/// their types, then yields the finished graph.
#[derive(Default)]
pub struct DeclarationAdapter {
    types: BTreeMap<String, TypeDecl>,
    packages: Vec<PackageDecl>,
}

impl DeclarationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers every item in one parsed file. Impl blocks for types declared
    /// in other files are merged once those types have been seen, so files
    /// may be lowered in any order.
    pub fn lower_file(&mut self, parsed: &ParsedFile) {
        let file = parsed.path.display().to_string();
        debug!("Lowering declarations from {}", file);
        let mut module_path = Vec::new();
        self.lower_items(&file, &mut module_path, &parsed.syntax_tree.items);
    }

    /// Finishes lowering and returns the declaration graph.
    pub fn finish(self) -> DeclarationGraph {
        let mut graph = DeclarationGraph::new();
        for decl in self.types.into_values() {
            graph.add_type(decl);
        }
        for pkg in self.packages {
            graph.add_package(pkg);
        }
        graph
    }

    fn lower_items(&mut self, file: &str, module_path: &mut Vec<String>, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Mod(m) => {
                    let annotations = lower_annotations(&m.attrs, None);
                    module_path.push(m.ident.to_string());
                    if !annotations.is_empty() {
                        self.packages.push(PackageDecl {
                            name: module_path.join("::"),
                            annotations,
                            position: position(file, m.ident.span()),
                        });
                    }
                    if let Some((_, nested)) = &m.content {
                        self.lower_items(file, module_path, nested);
                    }
                    module_path.pop();
                }
                syn::Item::Trait(t) => self.lower_trait(file, module_path, t),
                syn::Item::Struct(s) => self.lower_struct(file, module_path, s),
                syn::Item::Enum(e) => self.lower_enum(file, module_path, e),
                syn::Item::Impl(i) => self.lower_impl(file, module_path, i),
                _ => {}
            }
        }
    }

    fn lower_trait(&mut self, file: &str, module_path: &[String], item: &syn::ItemTrait) {
        let qualified = qualify(module_path, &item.ident.to_string());
        let mut decl = TypeDecl::new(&qualified, TypeKind::Interface)
            .with_annotations(lower_annotations(&item.attrs, None));
        decl.position = position(file, item.ident.span());
        decl.interfaces = supertrait_names(&item.supertraits);

        for trait_item in &item.items {
            if let syn::TraitItem::Fn(f) = trait_item {
                decl.methods.push(lower_method(file, &f.sig, &f.attrs));
            }
        }

        self.insert(decl);
    }

    fn lower_struct(&mut self, file: &str, module_path: &[String], item: &syn::ItemStruct) {
        let qualified = qualify(module_path, &item.ident.to_string());
        let mut decl = TypeDecl::new(&qualified, TypeKind::Class)
            .with_annotations(lower_annotations(&item.attrs, None));
        decl.position = position(file, item.ident.span());
        decl.superclass = structural_relation(&item.attrs, "extends").into_iter().next();
        decl.interfaces = structural_relation(&item.attrs, "implements");

        if let syn::Fields::Named(fields) = &item.fields {
            for field in &fields.named {
                let name = match &field.ident {
                    Some(ident) => ident.to_string(),
                    None => continue,
                };
                let mut field_decl = FieldDecl::new(&name, lower_type(&field.ty))
                    .with_annotations(lower_annotations(&field.attrs, Some(&name)));
                field_decl.position = position(file, field.ty.span());
                decl.fields.push(field_decl);
            }
        }

        self.insert(decl);
    }

    fn lower_enum(&mut self, file: &str, module_path: &[String], item: &syn::ItemEnum) {
        let qualified = qualify(module_path, &item.ident.to_string());
        let mut decl = TypeDecl::new(&qualified, TypeKind::Enum)
            .with_annotations(lower_annotations(&item.attrs, None));
        decl.position = position(file, item.ident.span());

        // Enum constants are modeled as static fields of the enum type.
        for variant in &item.variants {
            let mut constant = FieldDecl::new(
                variant.ident.to_string(),
                TypeRef::named(decl.simple_name.clone()),
            );
            constant.is_static = true;
            constant.position = position(file, variant.ident.span());
            decl.fields.push(constant);
        }

        self.insert(decl);
    }

    fn lower_impl(&mut self, file: &str, module_path: &[String], item: &syn::ItemImpl) {
        // Trait impls carry no contract information of their own; the
        // `#[implements]` relation on the struct covers them.
        if item.trait_.is_some() {
            return;
        }
        let self_name = match &*item.self_ty {
            syn::Type::Path(p) => match p.path.segments.last() {
                Some(seg) => seg.ident.to_string(),
                None => return,
            },
            _ => return,
        };
        let qualified = qualify(module_path, &self_name);

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for impl_item in &item.items {
            if let syn::ImplItem::Fn(f) = impl_item {
                if is_constructor(f) {
                    constructors.push(ConstructorDecl {
                        params: lower_params(file, &f.sig),
                        position: position(file, f.sig.ident.span()),
                    });
                } else {
                    methods.push(lower_method(file, &f.sig, &f.attrs));
                }
            }
        }
        let properties = pair_accessors(&mut methods);

        let decl = self
            .types
            .entry(qualified.clone())
            .or_insert_with(|| TypeDecl::new(&qualified, TypeKind::Class));
        decl.methods.extend(methods);
        decl.constructors.extend(constructors);
        decl.properties.extend(properties);
    }

    fn insert(&mut self, mut decl: TypeDecl) {
        // An impl block lowered before its type definition has left a
        // members-only placeholder behind; fold it in.
        if let Some(existing) = self.types.remove(&decl.qualified_name) {
            decl.methods.extend(existing.methods);
            decl.constructors.extend(existing.constructors);
            decl.properties.extend(existing.properties);
        }
        self.types.insert(decl.qualified_name.clone(), decl);
    }
}

fn qualify(module_path: &[String], name: &str) -> String {
    if module_path.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", module_path.join("::"), name)
    }
}

fn position(file: &str, span: proc_macro2::Span) -> Option<Position> {
    Some(Position::new(file, span.start().line))
}

fn supertrait_names(bounds: &Punctuated<TypeParamBound, Token![+]>) -> Vec<String> {
    bounds
        .iter()
        .filter_map(|bound| match bound {
            TypeParamBound::Trait(TraitBound { path, .. }) => {
                Some(path_to_name(path))
            }
            _ => None,
        })
        .collect()
}

fn path_to_name(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// Reads `#[extends("Base")]` or `#[implements("A", "B")]` from a struct.
fn structural_relation(attrs: &[syn::Attribute], name: &str) -> Vec<String> {
    for attr in attrs {
        if attr.path().is_ident(name) {
            return string_list(attr);
        }
    }
    Vec::new()
}

fn lower_method(file: &str, sig: &syn::Signature, attrs: &[syn::Attribute]) -> MethodDecl {
    let mut decl = MethodDecl::new(sig.ident.to_string())
        .with_annotations(lower_annotations(attrs, None))
        .with_params(lower_params(file, sig));
    decl.is_static = !has_receiver(sig);
    decl.position = position(file, sig.ident.span());
    if let syn::ReturnType::Type(_, ty) = &sig.output {
        decl.return_type = lower_return(ty);
    }
    decl
}

fn lower_params(file: &str, sig: &syn::Signature) -> Vec<ParamDecl> {
    sig.inputs
        .iter()
        .filter_map(|input| match input {
            syn::FnArg::Typed(pat_type) => {
                let name = match &*pat_type.pat {
                    syn::Pat::Ident(p) => p.ident.to_string(),
                    _ => return None,
                };
                let mut param = ParamDecl::new(&name, lower_type(&pat_type.ty))
                    .with_annotations(lower_annotations(&pat_type.attrs, Some(&name)));
                param.position = position(file, pat_type.ty.span());
                Some(param)
            }
            syn::FnArg::Receiver(_) => None,
        })
        .collect()
}

fn has_receiver(sig: &syn::Signature) -> bool {
    sig.inputs
        .iter()
        .any(|input| matches!(input, syn::FnArg::Receiver(_)))
}

/// An associated fn named `new`, or one marked `#[constructor]`, declares a
/// constructor.
fn is_constructor(f: &syn::ImplItemFn) -> bool {
    if has_receiver(&f.sig) {
        return false;
    }
    f.sig.ident == "new" || f.attrs.iter().any(|a| a.path().is_ident("constructor"))
}

/// Pairs `get_x`/`set_x` methods into accessor properties, draining the
/// paired halves out of `methods`. A getter that carries an HTTP verb or a
/// path stays a method.
fn pair_accessors(methods: &mut Vec<MethodDecl>) -> Vec<PropertyDecl> {
    let is_plain_accessor = |m: &MethodDecl| {
        !m.annotations.iter().any(|a| {
            matches!(a, Annotation::HttpMethod(_) | Annotation::Path(_))
        })
    };

    let mut properties: BTreeMap<String, PropertyDecl> = BTreeMap::new();
    let mut rest = Vec::new();
    for method in methods.drain(..) {
        let accessor = match method.name.strip_prefix("get_") {
            Some(prop) if method.params.is_empty() && method.return_type.is_some() => {
                Some((prop.to_string(), true))
            }
            _ => method
                .name
                .strip_prefix("set_")
                .filter(|_| method.params.len() == 1)
                .map(|prop| (prop.to_string(), false)),
        };
        match accessor {
            Some((prop_name, is_getter)) if is_plain_accessor(&method) => {
                let type_ref = if is_getter {
                    method.return_type.clone().unwrap_or(TypeRef::named("Object"))
                } else {
                    method.params[0].type_ref.clone()
                };
                let entry = properties.entry(prop_name.clone()).or_insert_with(|| {
                    let mut p = PropertyDecl::new(prop_name, type_ref.clone());
                    p.has_getter = false;
                    p.has_setter = false;
                    p.position = method.position.clone();
                    p
                });
                if is_getter {
                    entry.has_getter = true;
                    entry.type_ref = type_ref;
                    entry.getter_annotations = method.annotations;
                } else {
                    entry.has_setter = true;
                    entry.setter_annotations = method.annotations;
                }
            }
            _ => rest.push(method),
        }
    }
    *methods = rest;
    properties.into_values().collect()
}

/// Lowers a syntax-level type to a contract type reference. `Vec`, `HashSet`
/// and `BTreeSet` map to the contract collection names; `Option` unwraps to
/// its element; references are transparent.
pub fn lower_type(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Reference(r) => lower_type(&r.elem),
        syn::Type::Paren(p) => lower_type(&p.elem),
        syn::Type::Array(a) => TypeRef::array_of(lower_type(&a.elem)),
        syn::Type::Slice(s) => TypeRef::array_of(lower_type(&s.elem)),
        syn::Type::Path(p) => lower_type_path(&p.path),
        _ => {
            warn!("Unsupported type shape in contract source, treating as Object");
            TypeRef::named("Object")
        }
    }
}

fn lower_type_path(path: &syn::Path) -> TypeRef {
    let last = match path.segments.last() {
        Some(seg) => seg,
        None => return TypeRef::named("Object"),
    };
    let args = generic_args(last);
    let mapped = match last.ident.to_string().as_str() {
        "Vec" => Some("List"),
        "HashSet" => Some("Set"),
        "BTreeSet" => Some("SortedSet"),
        _ => None,
    };
    if let Some(collection) = mapped {
        return TypeRef::generic(collection, args);
    }
    if last.ident == "Option" {
        // Optionality is not part of the contract type; unwrap it.
        return args.into_iter().next().unwrap_or(TypeRef::named("Object"));
    }
    TypeRef {
        name: path_to_name(path),
        args,
        array: false,
    }
}

fn generic_args(segment: &syn::PathSegment) -> Vec<TypeRef> {
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(lower_type(ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn lower_return(ty: &syn::Type) -> Option<TypeRef> {
    if let syn::Type::Tuple(t) = ty {
        if t.elems.is_empty() {
            return None;
        }
    }
    Some(lower_type(ty))
}

/// Lowers the contract attributes on a declaration. Unrecognized attributes
/// (doc comments, derives) are ignored. `default_name` supplies the binding
/// name when an attribute such as `#[query]` omits its argument.
pub fn lower_annotations(attrs: &[syn::Attribute], default_name: Option<&str>) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for attr in attrs {
        let ident = match attr.path().get_ident() {
            Some(ident) => ident.to_string(),
            None => continue,
        };
        let named = |attr: &syn::Attribute| {
            string_arg(attr)
                .or_else(|| default_name.map(str::to_string))
                .unwrap_or_default()
        };
        let lowered = match ident.as_str() {
            "path" => string_arg(attr).map(Annotation::Path),
            "get" | "put" | "post" | "delete" | "head" | "options" | "patch" => {
                Some(Annotation::HttpMethod(ident.to_uppercase()))
            }
            "http_method" => string_arg(attr).map(Annotation::HttpMethod),
            "matrix" => Some(Annotation::Matrix(named(attr))),
            "query" => Some(Annotation::Query(named(attr))),
            "path_param" => Some(Annotation::PathParam(named(attr))),
            "cookie" => Some(Annotation::Cookie(named(attr))),
            "header" => Some(Annotation::Header(named(attr))),
            "form" => Some(Annotation::Form(named(attr))),
            "context" => Some(Annotation::Context),
            "default_value" => string_arg(attr).map(Annotation::DefaultValue),
            "consumes" => Some(Annotation::Consumes(string_list(attr))),
            "produces" => Some(Annotation::Produces(string_list(attr))),
            "web_service" => Some(lower_web_service(attr)),
            "soap_binding" => Some(lower_soap_binding(attr)),
            "one_way" => Some(Annotation::OneWay),
            "web_result" => lower_header_message(attr)
                .map(|(header, element_name)| Annotation::WebResult {
                    header,
                    element_name,
                }),
            "web_param" => lower_header_message(attr)
                .map(|(header, element_name)| Annotation::WebParam {
                    header,
                    element_name,
                }),
            "xml_id" => Some(Annotation::XmlId),
            "xml_id_ref" => Some(Annotation::XmlIdRef),
            "root_element" => Some(Annotation::RootElement(string_arg(attr))),
            "schema_namespace" => string_arg(attr).map(Annotation::SchemaNamespace),
            _ => None,
        };
        annotations.extend(lowered);
    }
    annotations
}

fn string_arg(attr: &syn::Attribute) -> Option<String> {
    attr.parse_args::<syn::LitStr>().ok().map(|lit| lit.value())
}

fn string_list(attr: &syn::Attribute) -> Vec<String> {
    attr.parse_args_with(Punctuated::<syn::LitStr, Token![,]>::parse_terminated)
        .map(|list| list.iter().map(|lit| lit.value()).collect())
        .unwrap_or_default()
}

fn lower_web_service(attr: &syn::Attribute) -> Annotation {
    let mut endpoint_interface = None;
    if matches!(attr.meta, syn::Meta::List(_)) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("endpoint_interface") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                endpoint_interface = Some(lit.value());
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Malformed web_service attribute: {}", e);
        }
    }
    Annotation::WebService { endpoint_interface }
}

fn lower_soap_binding(attr: &syn::Attribute) -> Annotation {
    let mut style = BindingStyle::Document;
    let mut parameter_style = ParameterStyle::Wrapped;
    if matches!(attr.meta, syn::Meta::List(_)) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("style") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                if lit.value() == "rpc" {
                    style = BindingStyle::Rpc;
                }
            } else if meta.path.is_ident("parameter_style") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                if lit.value() == "bare" {
                    parameter_style = ParameterStyle::Bare;
                }
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Malformed soap_binding attribute: {}", e);
        }
    }
    Annotation::SoapBinding {
        style,
        parameter_style,
    }
}

fn lower_header_message(attr: &syn::Attribute) -> Option<(bool, Option<String>)> {
    let mut header = false;
    let mut element_name = None;
    if matches!(attr.meta, syn::Meta::List(_)) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("header") {
                header = true;
            } else if meta.path.is_ident("name") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                element_name = Some(lit.value());
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!("Malformed header-message attribute: {}", e);
            return None;
        }
    }
    Some((header, element_name))
}
