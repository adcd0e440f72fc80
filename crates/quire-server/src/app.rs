//! Application state and router

use crate::config::ServerConfig;
use crate::handlers;
use crate::services::{
    AuthService, ContentRenderer, ContentService, FragmentCache, MediaStore, RenderSettings,
    TitleFetcher,
};
use crate::storage::{Database, MemoryCache};
use crate::views::Site;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Uploads larger than this are rejected
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub db: Arc<Database>,
    pub renderer: Arc<ContentRenderer>,
    pub auth_service: Arc<AuthService>,
    pub content: Arc<ContentService>,
}

impl AppState {
    /// Wire services around an open database
    pub fn new(config: ServerConfig, db: Arc<Database>) -> anyhow::Result<Self> {
        let fragments = FragmentCache::new(
            Arc::new(MemoryCache::new()),
            Duration::from_secs(config.fragment_cache_ttl_secs),
        );
        let renderer = Arc::new(ContentRenderer::new(
            db.clone(),
            fragments.clone(),
            RenderSettings::from(&config),
        ));
        let auth_service = Arc::new(AuthService::new(db.clone(), config.jwt_secret.clone()));
        let titles = TitleFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
        let media = Arc::new(MediaStore::new(config.media_root()));
        let content = Arc::new(ContentService::new(db.clone(), fragments, media, titles));

        Ok(Self {
            config: Arc::new(config),
            db,
            renderer,
            auth_service,
            content,
        })
    }

    pub fn site(&self) -> Site<'_> {
        Site {
            title: &self.config.site_title,
            media_url: &self.config.media_url,
            analytics: self.renderer.analytics(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let media_route = format!("/{}", state.config.media_url.trim_matches('/'));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .merge(site_routes())
        // Admin API
        .nest("/api/v1", api_routes())
        // Static files
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .nest_service(&media_route, ServeDir::new(state.config.media_root()))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn site_routes() -> Router<AppState> {
    use handlers::{paste, photo, web};

    Router::new()
        .route("/", get(web::home))
        .route("/page/:slug/", get(web::page))
        .route("/posts/", get(web::posts))
        .route("/posts/tag/:tag/", get(web::posts_by_tag))
        .route("/posts/:year/", get(web::posts_by_year))
        .route("/posts/:year/:month/", get(web::posts_by_month))
        .route("/post/:slug/", get(web::post))
        .route("/bookmarks/", get(web::bookmarks))
        .route("/bookmark/:slug/", get(web::bookmark))
        .route("/paste/", get(paste::index).post(paste::create))
        .route("/paste/group/:group/", get(paste::group))
        .route("/paste/:id/", get(paste::detail))
        .route("/photo/", get(photo::index))
        .route("/photo/albums/", get(photo::albums))
        .route("/photo/album/:aslug/", get(photo::album))
        .route("/photo/album/:aslug/:pslug/", get(photo::photo))
}

fn api_routes() -> Router<AppState> {
    use handlers::{admin, auth};

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/pages", get(admin::list_pages).post(admin::create_page))
        .route(
            "/pages/:slug",
            put(admin::update_page).delete(admin::delete_page),
        )
        .route("/posts", post(admin::create_post))
        .route(
            "/posts/:slug",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/posts/:slug/attachments", post(admin::add_attachment))
        .route("/bookmarks", post(admin::create_bookmark))
        .route("/bookmarks/:slug", delete(admin::delete_bookmark))
        .route("/albums", post(admin::create_album))
        .route("/albums/:slug/photos", post(admin::add_photo))
        .route("/pastes/:id", delete(admin::delete_paste))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use quire_core::ports::{AlbumStore, AttachmentStore, PageStore, PhotoStore, PostStore};
    use quire_core::{NewAlbum, NewAttachment, NewPage, NewPhoto, NewPost, Status};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        dir: tempfile::TempDir,
        state: AppState,
    }

    async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().to_path_buf(),
            static_dir: dir.path().join("static"),
            homepage: "welcome".to_string(),
            page_size: 2,
            jwt_secret: "test-secret".to_string(),
            fetch_timeout_secs: 1,
            ..ServerConfig::default()
        };
        let db = Arc::new(Database::in_memory().await.unwrap());
        let state = AppState::new(config, db).unwrap();
        state
            .auth_service
            .ensure_admin("admin@example.com", "secret-pass")
            .await
            .unwrap();
        TestApp { dir, state }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
            let response = router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(body.to_vec()).unwrap())
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn token(&self) -> String {
            let (status, body) = self
                .send(json_request(
                    "POST",
                    "/api/v1/auth/login",
                    None,
                    json!({"email": "admin@example.com", "password": "secret-pass"}),
                ))
                .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            let value: Value = serde_json::from_str(&body).unwrap();
            value["access_token"].as_str().unwrap().to_string()
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn public_page(state: &AppState, slug: &str, content: &str, status: Status) {
        state
            .db
            .create_page(&NewPage {
                slug: slug.to_string(),
                title: slug.to_string(),
                content: content.to_string(),
                markup: false,
                status,
                owner: None,
            })
            .await
            .unwrap();
    }

    async fn public_post(state: &AppState, slug: &str, tags: &str) {
        state
            .db
            .create_post(&NewPost {
                slug: slug.to_string(),
                title: format!("Title {}", slug),
                status: Status::Public,
                tags: tags.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn test_home_renders_homepage_with_includes() {
        let app = test_app().await;
        public_page(&app.state, "intro", "<em>hello</em>", Status::Draft).await;
        public_page(
            &app.state,
            "welcome",
            "Welcome! {% show_page \"intro\" %} {% unknown %}",
            Status::Public,
        )
        .await;

        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome! <em>hello</em> {% unknown %}"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_html_404() {
        let app = test_app().await;
        let (status, body) = app.get("/no/such/thing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>404</h1>"));
    }

    #[tokio::test]
    async fn test_home_without_homepage_page() {
        let app = test_app().await;
        let (status, body) = app.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_private_page_is_404() {
        let app = test_app().await;
        public_page(&app.state, "secret", "x", Status::Private).await;
        let (status, body) = app.get("/page/secret/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>404</h1>"));
    }

    #[tokio::test]
    async fn test_post_pagination() {
        let app = test_app().await;
        for slug in ["a", "b", "c"] {
            public_post(&app.state, slug, "").await;
        }

        let (status, body) = app.get("/posts/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Page 1 of 2"));

        let (status, body) = app.get("/posts/?page=last").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Page 2 of 2"));

        assert_eq!(app.get("/posts/?page=3").await.0, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/posts/?page=x").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tag_listing_matches_whole_tags() {
        let app = test_app().await;
        public_post(&app.state, "one", "rust, web").await;
        public_post(&app.state, "two", "rustacean").await;

        let (status, body) = app.get("/posts/tag/rust/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title one"));
        assert!(!body.contains("Title two"));
    }

    #[tokio::test]
    async fn test_month_archive_validates_month() {
        let app = test_app().await;
        let year = quire_core::now().format("%Y").to_string();
        assert_eq!(
            app.get(&format!("/posts/{}/13/", year)).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            app.get(&format!("/posts/{}/1/", year)).await.0,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_out_of_range_year_archive_is_404() {
        let app = test_app().await;
        assert_eq!(app.get("/posts/300000/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(app.get("/posts/2147483647/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            app.get("/posts/2147483647/12/").await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(app.get("/posts/2012/").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_detail_expands_attachment_tags() {
        let app = test_app().await;
        let post = app
            .state
            .db
            .create_post(&NewPost {
                slug: "talk".to_string(),
                title: "Talk".to_string(),
                content: "Get {% post_file_link \"deck\" %}".to_string(),
                status: Status::Public,
                ..Default::default()
            })
            .await
            .unwrap();
        app.state
            .db
            .create_attachment(&NewAttachment {
                post_id: post.id,
                slug: "deck".to_string(),
                name: "Deck & notes".to_string(),
                file: "attachments/2012/01/01/deck.pdf".to_string(),
            })
            .await
            .unwrap();

        let (status, body) = app.get("/post/talk/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(
            "<a href=\"/media/attachments/2012/01/01/deck.pdf\" class=\"post-file-link\">Deck &amp; notes</a>"
        ));
        assert!(body.contains("(deck.pdf)"));
    }

    #[tokio::test]
    async fn test_paste_create_redirects_and_renders() {
        let app = test_app().await;
        let request = Request::post("/paste/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("text=print%28%27hi%27%29&lexer=py&title=&group=demo"))
            .unwrap();
        let response = router(app.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        assert!(location.starts_with("/paste/"));

        let (status, body) = app.get(&location).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<pre class=\"paste lexer-py\">"));
        assert!(body.contains("print(&#39;hi&#39;)") || body.contains("print('hi')"));

        let (status, body) = app.get("/paste/group/demo/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Group: demo"));
    }

    #[tokio::test]
    async fn test_paste_rejects_unknown_lexer() {
        let app = test_app().await;
        let request = Request::post("/paste/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("text=x&lexer=cobol"))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("unknown lexer"));
    }

    #[tokio::test]
    async fn test_photo_scoped_to_album() {
        let app = test_app().await;
        let db = &app.state.db;
        let first = db
            .create_album(&NewAlbum {
                slug: "first".to_string(),
                title: "First".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.create_album(&NewAlbum {
            slug: "second".to_string(),
            title: "Second".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        db.create_photo(&NewPhoto {
            album_id: first.id,
            slug: "sunset".to_string(),
            title: "Sunset".to_string(),
            description: String::new(),
            image: "photos/2012/01/01/sunset.jpg".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(app.get("/photo/album/first/sunset/").await.0, StatusCode::OK);
        assert_eq!(
            app.get("/photo/album/second/sunset/").await.0,
            StatusCode::NOT_FOUND
        );

        let (status, body) = app.get("/photo/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("href=\"/photo/album/first/sunset/\""));
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let app = test_app().await;
        let (status, body) = app
            .send(json_request("POST", "/api/v1/pages", None, json!({"title": "x"})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["code"], "unauthorized");

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/login",
                None,
                json!({"email": "admin@example.com", "password": "wrong"}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_page_edit_invalidates_fragments() {
        let app = test_app().await;
        let token = app.token().await;

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/pages",
                Some(&token),
                json!({"title": "Welcome", "content": "first", "status": "public"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let page: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(page["slug"], "welcome");

        assert!(app.get("/").await.1.contains("first"));

        let request = Request::get("/api/v1/pages")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let pages: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(pages.as_array().map(Vec::len), Some(1));

        let (status, _) = app
            .send(json_request(
                "PUT",
                "/api/v1/pages/welcome",
                Some(&token),
                json!({"title": "Welcome", "content": "second", "status": "public"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(app.get("/").await.1.contains("second"));

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/pages",
                Some(&token),
                json!({"title": "Other", "slug": "welcome"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_admin_attachment_upload() {
        let app = test_app().await;
        let token = app.token().await;
        public_post(&app.state, "talk", "").await;

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nSlides\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"Deck.PDF\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/v1/posts/talk/attachments")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let attachment: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(attachment["slug"], "slides");
        let file = attachment["file"].as_str().unwrap();
        assert!(file.ends_with("/deck.pdf"));
        assert!(app.dir.path().join("media").join(file).exists());

        let stored = app.state.db.get_attachment("slides").await.unwrap().unwrap();
        assert_eq!(stored.name, "Slides");
    }
}
