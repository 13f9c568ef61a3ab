//! Conversion of handler results into HTTP responses.
//!
//! The [`Responder`] trait lets a handler built with [`handler_fn`](crate::handler_fn)
//! return plain values like strings, status codes or `Result`s.

use crate::body::ResponseBody;
use http::{HeaderValue, Response, StatusCode};
use std::convert::Infallible;

/// A trait for types that can be converted into HTTP responses.
pub trait Responder {
    fn into_response(self) -> Response<ResponseBody>;
}

/// The Ok and Err variants must both implement Responder.
impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// None case returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn into_response(self) -> Response<ResponseBody> {
        match self {
            Some(t) => t.into_response(),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn into_response(self) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn into_response(self) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.into_response();
        *response.status_mut() = status;
        response
    }
}

impl<T: Responder> Responder for (T, StatusCode) {
    fn into_response(self) -> Response<ResponseBody> {
        let (responder, status) = self;
        (status, responder).into_response()
    }
}

impl<T: Responder> Responder for Box<T> {
    fn into_response(self) -> Response<ResponseBody> {
        (*self).into_response()
    }
}

impl Responder for () {
    fn into_response(self) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

impl Responder for &'static str {
    fn into_response(self) -> Response<ResponseBody> {
        plain_text(ResponseBody::from(self))
    }
}

impl Responder for String {
    fn into_response(self) -> Response<ResponseBody> {
        plain_text(ResponseBody::from(self))
    }
}

impl Responder for Infallible {
    fn into_response(self) -> Response<ResponseBody> {
        match self {}
    }
}

fn plain_text(body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    response.headers_mut().insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

#[cfg(test)]
mod tests {
    use super::Responder;
    use http::StatusCode;

    #[test]
    fn test_str_is_plain_text() {
        let response = "hello".into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn test_status_tuple() {
        let response = (StatusCode::NOT_FOUND, "404 page not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = (String::from("created"), StatusCode::CREATED).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_result() {
        let ok: Result<&'static str, (StatusCode, ())> = Ok("ok");
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let err: Result<&'static str, (StatusCode, ())> = Err((StatusCode::BAD_REQUEST, ()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
