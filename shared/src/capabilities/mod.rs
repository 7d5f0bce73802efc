mod http;

pub use self::http::{
    decode_reply, read_reply, ApiEndpoint, ApiEnvelope, ApiReply, EndpointError, HttpMethod,
    HttpResult, TransportFailure,
};

pub use crux_core::render::Render;
pub use crux_http::Http;

// The Effect derive refers to the app type by name.
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
