mod codec;
mod request;
