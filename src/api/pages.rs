//! Minimal server-rendered entry pages. The real UI is a separate frontend;
//! these exist so the admin subtree has a guarded surface and the login
//! redirect has somewhere to land.

use axum::response::Html;

pub async fn login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Login</title></head>\
         <body><h1>Sign in</h1>\
         <p>POST /api/auth/login with username and password.</p>\
         </body></html>",
    )
}

pub async fn admin_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Admin</title></head>\
         <body><h1>Admin panel</h1></body></html>",
    )
}
