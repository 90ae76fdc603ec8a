use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Error, Fields, LitStr, Type, Visibility};

pub const DDB: &str = "ddb";
pub const DDB_GSI: &str = "ddb_gsi";
const IGNORE: &str = "ignore";

pub struct RawFieldDef {
    pub ident: syn::Ident,
    pub ty: Type,
    pub visible: bool,
    pub annotation: Option<LitStr>,
    pub index_annotation: Option<LitStr>,
}

impl RawFieldDef {
    /// Fields that can never reach the marshal engine get no accessor code, so
    /// their types need not implement the serde traits.
    pub fn is_mapped(&self) -> bool {
        if !self.visible {
            return false;
        }
        match &self.annotation {
            Some(lit) => !lit
                .value()
                .split(',')
                .skip(1)
                .any(|token| token.trim() == IGNORE),
            None => true,
        }
    }

    pub fn declared_name(&self) -> String {
        self.ident.unraw().to_string()
    }
}

pub fn parse_fields(input: &DeriveInput) -> Result<Vec<RawFieldDef>, Error> {
    let Data::Struct(ds) = &input.data else {
        return Err(Error::new_spanned(
            input,
            "Record can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &ds.fields else {
        return Err(Error::new_spanned(
            &ds.fields,
            "Record requires a struct with named fields",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let mut defs = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = field.ident.clone() else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        let annotation = single_string_attr(&field.attrs, DDB)?;
        let index_annotation = single_string_attr(&field.attrs, DDB_GSI)?;
        let def = RawFieldDef {
            ident,
            ty: field.ty.clone(),
            visible: matches!(field.vis, Visibility::Public(_)),
            annotation,
            index_annotation,
        };
        if def.is_mapped() && is_borrowed(&def.ty) {
            return Err(Error::new_spanned(
                &field.ty,
                "stored fields must own their data; use an owned type or `#[ddb(\",ignore\")]`",
            ));
        }
        defs.push(def);
    }
    Ok(defs)
}

// Accepts `#[ddb("...")]` at most once per field.
fn single_string_attr(attrs: &[Attribute], name: &str) -> Result<Option<LitStr>, Error> {
    let mut found: Option<LitStr> = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident(name)) {
        let lit: LitStr = attr.parse_args().map_err(|err| {
            let mut diagnostic = Error::new_spanned(
                attr,
                format!("expected `#[{name}(\"...\")]` with a single string literal"),
            );
            diagnostic.combine(err);
            diagnostic
        })?;
        if found.is_some() {
            return Err(Error::new_spanned(
                attr,
                format!("`#[{name}]` may appear only once per field"),
            ));
        }
        found = Some(lit);
    }
    Ok(found)
}

// References cannot be decoded into.
fn is_borrowed(ty: &Type) -> bool {
    match ty {
        Type::Reference(_) => true,
        Type::Paren(p) => is_borrowed(&p.elem),
        Type::Group(g) => is_borrowed(&g.elem),
        _ => false,
    }
}
