mod common;
mod notifications;
mod status;
