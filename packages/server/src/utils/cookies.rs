use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const ACCESS_TOKEN: &str = "accessToken";
pub const REFRESH_TOKEN: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Add both auth cookies to `jar`.
pub fn set_auth_cookies(jar: CookieJar, access: &str, refresh: &str, secure: bool) -> CookieJar {
    jar.add(auth_cookie(ACCESS_TOKEN, access.to_string(), secure))
        .add(auth_cookie(REFRESH_TOKEN, refresh.to_string(), secure))
}

/// Expire both auth cookies.
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN).path("/"))
}
