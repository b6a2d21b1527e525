use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use crate::config::SessionCookieSettings;

/// Build the access-token cookie. HttpOnly and SameSite=Lax so scripts
/// never see the token and cross-site POSTs never carry it.
pub fn access_cookie(
    settings: &SessionCookieSettings,
    token: String,
    max_age: std::time::Duration,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.cookie_name.clone(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(settings.secure);
    cookie.set_max_age(time::Duration::try_from(max_age).unwrap_or(time::Duration::ZERO));
    cookie
}

/// Expired replacement for the access cookie. Attributes must match the
/// original or browsers keep the old one.
pub fn clear_cookie(settings: &SessionCookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(settings.secure);
    cookie.set_max_age(time::Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SessionCookieSettings {
        SessionCookieSettings {
            cookie_name: "katiba_access_token".to_string(),
            secure: false,
        }
    }

    #[test]
    fn access_cookie_is_http_only_and_lax() {
        let cookie = access_cookie(
            &settings(),
            "tok".to_string(),
            std::time::Duration::from_secs(900),
        );
        assert_eq!(cookie.name(), "katiba_access_token");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
    }

    #[test]
    fn clear_cookie_expires_in_the_past() {
        let cookie = clear_cookie(&settings());
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn secure_flag_follows_configuration() {
        let mut s = settings();
        s.secure = true;
        let cookie = access_cookie(&s, "tok".to_string(), std::time::Duration::from_secs(60));
        assert_eq!(cookie.secure(), Some(true));
    }
}
