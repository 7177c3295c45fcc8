use syn::{punctuated::Punctuated, token::Comma, Attribute, Expr, ExprAssign, Field, Lit, Meta};

pub const ATTR: &str = "wire";

pub fn find_attr<'a>(attrs: &'a [Attribute]) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(ATTR))
}

pub fn has_attr(field: &Field) -> bool {
    find_attr(&field.attrs).is_some()
}

pub fn get_punctuated(attr: &Attribute, name: &str) -> Punctuated<ExprAssign, Comma> {
    match &attr.meta {
                Meta::List(meta_list) => meta_list
                    .clone()
                    .parse_args_with(Punctuated::<ExprAssign, Comma>::parse_terminated)
                    .unwrap_or_else(|_| panic!("`wire` attribute for `{name}` is not a comma separated sequence of assignment expressions.")),
                _ => panic!("The `wire` attribute is not `MetaList`"),
            }
}

pub fn expr_assign_predicate<'a>(
    key: &'a str,
    name: &'a str,
) -> impl FnMut(&&ExprAssign) -> bool + 'a {
    move |expr_assign| match *expr_assign.left.clone() {
        Expr::Path(left) => left.path.is_ident(key),
        not_expr_path => panic!(
            "In the `wire` attribute for {}, the key `{:?}` is not a path expression.",
            name, not_expr_path
        ),
    }
}

/// Value of `key` as an integer literal, if the key is present.
pub fn get_int<N>(punctuated: &Punctuated<ExprAssign, Comma>, key: &str, name: &str) -> Option<N>
where
    N: std::str::FromStr,
    N::Err: std::fmt::Display,
{
    punctuated
        .iter()
        .filter(expr_assign_predicate(key, name))
        .map(|expr_assign| match *expr_assign.right.clone() {
            Expr::Lit(right) => match right.lit {
                Lit::Int(lit_int) => lit_int,
                _ => panic_not_literal(key, "integer", name),
            },
            _ => panic_not_literal(key, "", name),
        })
        .next()
        .map(|lit_int| {
            lit_int.base10_parse::<N>().unwrap_or_else(|err| {
                panic!("In `wire` attribute for `{name}`, the key `{key}` could not be parsed: {err}.")
            })
        })
}

/// Value of `key` as a string literal, if the key is present.
pub fn get_str(punctuated: &Punctuated<ExprAssign, Comma>, key: &str, name: &str) -> Option<String> {
    punctuated
        .iter()
        .filter(expr_assign_predicate(key, name))
        .map(|expr_assign| match *expr_assign.right.clone() {
            Expr::Lit(right) => match right.lit {
                Lit::Str(lit_str) => lit_str,
                _ => panic_not_literal(key, "string", name),
            },
            _ => panic_not_literal(key, "", name),
        })
        .next()
        .map(|lit_str| lit_str.value())
}

pub fn panic_not_literal(key: &str, lit_ty: &str, name: &str) -> ! {
    panic!(
        "In `wire` attribute for `{}`, the key `{}` is not set to a {} literal.",
        name, key, lit_ty
    )
}

/// Panic on keys the attribute does not know, which usually are typos.
pub fn check_keys(punctuated: &Punctuated<ExprAssign, Comma>, allowed: &[&str], name: &str) {
    for expr_assign in punctuated {
        let key = match *expr_assign.left.clone() {
            Expr::Path(left) => left.path.get_ident().map(ToString::to_string),
            _ => None,
        };
        match key {
            Some(key) if allowed.contains(&key.as_str()) => {}
            key => panic!(
                "In `wire` attribute for `{}`, unexpected key `{}`. Use one of {:?}.",
                name,
                key.unwrap_or_default(),
                allowed
            ),
        }
    }
}

pub fn has_key(punctuated: &Punctuated<ExprAssign, Comma>, key: &str, name: &str) -> bool {
    punctuated
        .iter()
        .filter(expr_assign_predicate(key, name))
        .next()
        .is_some()
}
