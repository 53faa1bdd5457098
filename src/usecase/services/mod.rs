pub mod composer;
pub mod materializer;
pub mod response;
pub mod view;
