//! Status code rules shared by the response writer and the chunk writer.

use http::StatusCode;

/// Reports whether a response with the given status may carry a body.
///
/// Informational (1xx), `204 No Content` and `304 Not Modified` responses never have one,
/// see RFC 9110, section 6.4.1.
#[inline]
pub fn body_allowed_for_status(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

/// Validates a status code passed to `write_header`.
///
/// Only three digit codes are accepted. Anything else is a bug in the calling handler, so this
/// panics instead of returning an error.
///
/// # Panics
///
/// Panics if `code` is outside `100..=999`.
pub fn check_write_header_code(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) => status,
        Err(_) => panic!("invalid WriteHeader code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_allowed_for_status() {
        assert!(!body_allowed_for_status(StatusCode::CONTINUE));
        assert!(!body_allowed_for_status(StatusCode::SWITCHING_PROTOCOLS));
        assert!(!body_allowed_for_status(StatusCode::from_u16(199).unwrap()));
        assert!(!body_allowed_for_status(StatusCode::NO_CONTENT));
        assert!(!body_allowed_for_status(StatusCode::NOT_MODIFIED));

        assert!(body_allowed_for_status(StatusCode::OK));
        assert!(body_allowed_for_status(StatusCode::NOT_FOUND));
        assert!(body_allowed_for_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(body_allowed_for_status(StatusCode::from_u16(999).unwrap()));
    }

    #[test]
    fn test_check_write_header_code() {
        assert_eq!(check_write_header_code(100), StatusCode::CONTINUE);
        assert_eq!(check_write_header_code(200), StatusCode::OK);
        assert_eq!(check_write_header_code(999).as_u16(), 999);
    }

    #[test]
    #[should_panic(expected = "invalid WriteHeader code 0")]
    fn test_check_write_header_code_zero() {
        check_write_header_code(0);
    }

    #[test]
    #[should_panic(expected = "invalid WriteHeader code 1000")]
    fn test_check_write_header_code_too_large() {
        check_write_header_code(1000);
    }

    #[test]
    #[should_panic(expected = "invalid WriteHeader code 99")]
    fn test_check_write_header_code_two_digits() {
        check_write_header_code(99);
    }
}
