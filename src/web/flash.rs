use crate::handlers::{Flash, FlashKind};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

pub const COOKIE_NAME: &str = "flash";

/// Take the flash left by the previous redirect, clearing its cookie
pub fn take(cookies: &Cookies) -> Option<Flash> {
    let raw = cookies.get(COOKIE_NAME)?.value().to_string();
    cookies.remove(Cookie::build(COOKIE_NAME).path("/").build());
    decode(&raw)
}

/// Keep `flash` until the next rendered page
pub fn store(cookies: &Cookies, flash: &Flash) {
    let cookie = Cookie::build((COOKIE_NAME, encode(flash)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookies.add(cookie);
}

fn encode(flash: &Flash) -> String {
    format!(
        "{}:{}",
        flash.kind.as_str(),
        urlencoding::encode(&flash.message)
    )
}

fn decode(raw: &str) -> Option<Flash> {
    let (kind, message) = raw.split_once(':')?;
    let kind = FlashKind::parse(kind)?;
    let message = urlencoding::decode(message).ok()?.into_owned();
    Some(Flash { kind, message })
}
