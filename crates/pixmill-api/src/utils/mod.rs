pub mod url_guard;
