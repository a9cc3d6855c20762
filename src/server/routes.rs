use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::{Admin, AppState, Error, IsAdmin};
use crate::content::{Format, Post};
use crate::repo::slug::{is_slug_path, normalize_lookup};
use crate::repo::{ListQuery, NewPost, PostEdit};
use crate::templates;

/// Number of entries in the Atom feed
const FEED_SIZE: usize = 20;

const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

type Result<T> = std::result::Result<T, Error>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/page/:page", get(index_page))
        .route("/tags/:tag", get(tagged))
        .route("/tags/:tag/page/:page", get(tagged_page))
        .route("/archive", get(archive))
        .route("/feed", get(feed))
        .route("/rss", get(feed))
        .route("/feed.xml", get(feed))
        .route("/rss.xml", get(feed))
        .route("/auth", get(auth_form).post(login))
        .route("/logout", get(logout))
        .route("/posts/new", get(new_post))
        .route("/posts", post(create_post))
        .route("/:year/:month", get(month))
        .route("/:year/:month/", get(month))
        .route("/:year/:month/:day/:slug", get(show_post))
        .route("/:year/:month/:day/:slug/", get(show_post).post(update_post))
        .route("/:year/:month/:day/:slug/edit", get(edit_post))
        .route("/:year/:month/:day/:slug/edit/", get(edit_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a page number from the path; pages below 1 are clamped to 1
fn parse_page(page: &str) -> Result<usize> {
    if page.is_empty() || !page.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::NotFound);
    }
    page.parse::<usize>()
        .map(|page| page.max(1))
        .map_err(|_| Error::NotFound)
}

fn is_digits(segment: &str, len: usize) -> bool {
    segment.len() == len && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Turn the `:y/:m/:d/:slug` segments of a post URL into a stored slug
fn post_slug(year: &str, month: &str, day: &str, slug: &str) -> Result<String> {
    if !(is_digits(year, 4) && is_digits(month, 2) && is_digits(day, 2)) {
        return Err(Error::NotFound);
    }
    let slug = normalize_lookup(slug);
    if !is_slug_path(&slug) {
        return Err(Error::NotFound);
    }
    Ok(slug)
}

async fn index(state: State<AppState>, admin: IsAdmin) -> Result<Response> {
    render_index(state, admin, 1).await
}

async fn index_page(
    state: State<AppState>,
    admin: IsAdmin,
    Path(page): Path<String>,
) -> Result<Response> {
    let page = parse_page(&page)?;
    render_index(state, admin, page).await
}

async fn render_index(
    State(state): State<AppState>,
    IsAdmin(admin): IsAdmin,
    page: usize,
) -> Result<Response> {
    let query = ListQuery::new(true, state.config.page_size).page(page);
    let posts = state.repo.list(&query).await?;
    if posts.is_past_end() {
        return Ok(Redirect::to("/").into_response());
    }
    let months = state.repo.months_index(!admin).await?;

    Ok(Html(templates::index_page(
        &state.config,
        &state.renderer,
        &posts,
        &months,
        admin,
    ))
    .into_response())
}

async fn tagged(
    state: State<AppState>,
    admin: IsAdmin,
    Path(tag): Path<String>,
) -> Result<Response> {
    render_tagged(state, admin, &tag, 1).await
}

async fn tagged_page(
    state: State<AppState>,
    admin: IsAdmin,
    Path((tag, page)): Path<(String, String)>,
) -> Result<Response> {
    let page = parse_page(&page)?;
    render_tagged(state, admin, &tag, page).await
}

async fn render_tagged(
    State(state): State<AppState>,
    IsAdmin(admin): IsAdmin,
    tag: &str,
    page: usize,
) -> Result<Response> {
    let query = ListQuery::new(true, state.config.page_size)
        .tag(tag)
        .page(page);
    let posts = state.repo.list(&query).await?;
    if posts.is_past_end() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(Html(templates::tagged_page(
        &state.config,
        &state.renderer,
        &posts,
        tag,
        admin,
    ))
    .into_response())
}

async fn archive(
    State(state): State<AppState>,
    IsAdmin(admin): IsAdmin,
) -> Result<Html<String>> {
    let posts = state.repo.archive(!admin).await?;
    Ok(Html(templates::archive_page(&state.config, &posts, admin)))
}

async fn month(
    State(state): State<AppState>,
    IsAdmin(admin): IsAdmin,
    Path((year, month)): Path<(String, String)>,
) -> Result<Html<String>> {
    if !(is_digits(&year, 4) && is_digits(&month, 2)) {
        return Err(Error::NotFound);
    }
    let year: i32 = year.parse().map_err(|_| Error::NotFound)?;
    let month: u32 = month.parse().map_err(|_| Error::NotFound)?;

    let posts = state.repo.posts_in_month(!admin, year, month).await?;
    Ok(Html(templates::archive_page(&state.config, &posts, admin)))
}

async fn show_post(
    State(state): State<AppState>,
    IsAdmin(admin): IsAdmin,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Result<Html<String>> {
    let slug = post_slug(&year, &month, &day, &slug)?;
    let post = state
        .repo
        .find_by_slug(&slug, !admin)
        .await?
        .ok_or(Error::NotFound)?;

    Ok(Html(templates::post_page(
        &state.config,
        &state.renderer,
        &post,
        admin,
    )))
}

async fn feed(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let posts = state.repo.recent(FEED_SIZE).await?;
    let body = templates::atom_feed(&state.config, &state.renderer, &posts);
    Ok(([(header::CONTENT_TYPE, ATOM_CONTENT_TYPE)], body))
}

async fn auth_form(State(state): State<AppState>) -> Html<String> {
    Html(templates::auth_page(&state.config, false))
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if state.auth.verify_password(&form.password) {
        tracing::info!("Admin logged in");
        let cookie = state.auth.login_cookie();
        ([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/")).into_response()
    } else {
        tracing::warn!("Rejected admin login attempt");
        Html(templates::auth_page(&state.config, true)).into_response()
    }
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.auth.logout_cookie();
    ([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/"))
}

/// Fields of the create/edit form; checkboxes are absent when unchecked
#[derive(Deserialize, Default)]
#[serde(default)]
struct PostForm {
    title: String,
    tags: String,
    content: String,
    format: String,
    delete_status: Option<String>,
    change_slug: Option<String>,
}

async fn new_post(State(state): State<AppState>, _: Admin) -> Html<String> {
    Html(templates::edit_page(&state.config, &Post::default(), "/posts"))
}

async fn create_post(
    State(state): State<AppState>,
    _: Admin,
    Form(form): Form<PostForm>,
) -> Result<Redirect> {
    let post = state
        .repo
        .create(NewPost {
            title: form.title,
            content: form.content,
            tags: form.tags,
            format: Format::parse(&form.format),
        })
        .await?;
    Ok(Redirect::to(&post.url()))
}

async fn edit_post(
    State(state): State<AppState>,
    _: Admin,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Result<Html<String>> {
    let slug = post_slug(&year, &month, &day, &slug)?;
    let post = state
        .repo
        .find_by_slug(&slug, false)
        .await?
        .ok_or(Error::NotFound)?;

    Ok(Html(templates::edit_page(&state.config, &post, &post.url())))
}

async fn update_post(
    State(state): State<AppState>,
    _: Admin,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
    Form(form): Form<PostForm>,
) -> Result<Redirect> {
    let slug = post_slug(&year, &month, &day, &slug)?;
    let delete = form.delete_status.is_some();
    let post = state
        .repo
        .edit(
            &slug,
            PostEdit {
                title: form.title,
                content: form.content,
                tags: form.tags,
                format: Format::parse(&form.format),
                change_slug: form.change_slug.is_some(),
                delete,
            },
        )
        .await?;

    if delete {
        Ok(Redirect::to("/"))
    } else {
        Ok(Redirect::to(&post.url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BlogConfig, Timezone};
    use crate::repo::PostRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn state() -> AppState {
        let config = BlogConfig {
            page_size: 2,
            admin_password: "secret".to_string(),
            admin_cookie_key: "blog_admin".to_string(),
            admin_cookie_value: "cookie-secret".to_string(),
            ..Default::default()
        };
        let repo = PostRepository::in_memory(Timezone::default()).await.unwrap();
        AppState::new(config, repo).unwrap()
    }

    async fn create(state: &AppState, title: &str, tags: &str) -> Post {
        state
            .repo
            .create(NewPost {
                title: title.to_string(),
                content: format!("Body of {}", title),
                tags: tags.to_string(),
                format: Format::Txt,
            })
            .await
            .unwrap()
    }

    fn admin_cookie(state: &AppState) -> String {
        let cookie = state.auth.login_cookie();
        format!("{}={}", cookie.name(), cookie.value())
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, String, Option<String>) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), location)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_visible_posts() {
        let state = state().await;
        create(&state, "First post", "rust").await;
        let mut hidden = create(&state, "Hidden post", "rust").await;
        state.repo.set_deleted(&mut hidden, true).await.unwrap();

        let (status, body, _) = send(&state, get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("First post"));
        assert!(!body.contains("Hidden post"));
        assert!(!body.contains("class=\"paginate\""));
    }

    #[tokio::test]
    async fn test_pagination_and_past_end_redirect() {
        let state = state().await;
        for title in ["One", "Two", "Three"] {
            create(&state, title, "misc").await;
        }

        let (status, body, _) = send(&state, get_request("/page/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/page/1"));

        let (status, _, location) = send(&state, get_request("/page/3")).await;
        assert!(status.is_redirection());
        assert_eq!(location.as_deref(), Some("/"));

        let (status, _, _) = send(&state, get_request("/page/abc")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_huge_page_number_redirects_home() {
        let state = state().await;

        let (status, _, location) =
            send(&state, get_request("/page/18446744073709551615")).await;
        assert!(status.is_redirection());
        assert_eq!(location.as_deref(), Some("/"));

        create(&state, "Tagged", "misc").await;
        let (status, _, location) =
            send(&state, get_request("/tags/misc/page/18446744073709551615")).await;
        assert!(status.is_redirection());
        assert_eq!(location.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_tagged_substring_match() {
        let state = state().await;
        create(&state, "Carts", "cart").await;
        create(&state, "Dogs", "dog").await;

        let (status, body, _) = send(&state, get_request("/tags/art")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carts"));
        assert!(!body.contains("Dogs"));
    }

    #[tokio::test]
    async fn test_tag_with_reserved_characters() {
        let state = state().await;
        let post = create(&state, "Sharp", "c#").await;

        let (_, body, _) = send(&state, get_request(&post.url())).await;
        assert!(body.contains(r#"href="/tags/c%23""#));

        let (status, body, _) = send(&state, get_request("/tags/c%23")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Sharp"));
    }

    #[tokio::test]
    async fn test_show_post_and_not_found() {
        let state = state().await;
        let post = create(&state, "Hello World", "greeting").await;

        let (status, body, _) = send(&state, get_request(&post.url())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Body of Hello World"));

        let without_slash = post.url().trim_end_matches('/').to_string();
        let (status, _, _) = send(&state, get_request(&without_slash)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(&state, get_request("/2020/01/01/missing/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Page not found");

        let (status, _, _) = send(&state, get_request("/20/01/01/hello-world/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_hidden_post_visible_to_admin_only() {
        let state = state().await;
        let mut post = create(&state, "Secret", "x").await;
        state.repo.set_deleted(&mut post, true).await.unwrap();

        let (status, _, _) = send(&state, get_request(&post.url())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .uri(post.url())
            .header(header::COOKIE, admin_cookie(&state))
            .body(Body::empty())
            .unwrap();
        let (status, body, _) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Secret"));
    }

    #[tokio::test]
    async fn test_month_view() {
        let state = state().await;
        let post = create(&state, "Monthly", "x").await;
        let created = post.created_at.unwrap();

        let uri = created.format("/%Y/%m").to_string();
        let (status, body, _) = send(&state, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Monthly"));

        let (status, body, _) = send(&state, get_request("/1999/01/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("Monthly"));

        let (status, _, _) = send(&state, get_request("/1999/1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feed() {
        let state = state().await;
        create(&state, "Feed entry", "x").await;

        for uri in ["/feed", "/rss", "/feed.xml", "/rss.xml"] {
            let response = router(state.clone())
                .oneshot(get_request(uri))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                ATOM_CONTENT_TYPE
            );
        }

        let (_, body, _) = send(&state, get_request("/feed")).await;
        assert!(body.contains("<title>Feed entry</title>"));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let state = state().await;

        let (status, body, _) = send(&state, form_request("/auth", "password=wrong", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Wrong password"));

        let response = router(state.clone())
            .oneshot(form_request("/auth", "password=secret", None))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("blog_admin="));

        let response = router(state.clone())
            .oneshot(get_request("/logout"))
            .await
            .unwrap();
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_admin_routes_require_cookie() {
        let state = state().await;
        let post = create(&state, "Guarded", "x").await;

        let (status, body, _) = send(&state, get_request("/posts/new")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Not authorized");

        let (status, _, _) = send(&state, form_request("/posts", "title=x", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let edit_url = format!("{}edit", post.url());
        let (status, _, _) = send(&state, get_request(&edit_url)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&state, form_request(&post.url(), "title=x", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_create_edit_delete() {
        let state = state().await;
        let cookie = admin_cookie(&state);

        let (status, body, _) = send(
            &state,
            Request::builder()
                .uri("/posts/new")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"action="/posts""#));

        let (status, _, location) = send(
            &state,
            form_request(
                "/posts",
                "title=My+Post&tags=rust+web&content=Hello&format=markdown",
                Some(&cookie),
            ),
        )
        .await;
        assert!(status.is_redirection());
        let url = location.unwrap();
        assert!(url.ends_with("/my-post/"));

        let post = state.repo.find_by_slug("my-post", true).await.unwrap().unwrap();
        assert_eq!(post.format, Format::Markdown);
        assert_eq!(post.tags, "rust web");

        let (status, _, location) = send(
            &state,
            form_request(
                &url,
                "title=Renamed&tags=rust&content=Updated&format=txt&change_slug=1",
                Some(&cookie),
            ),
        )
        .await;
        assert!(status.is_redirection());
        assert!(location.unwrap().ends_with("/renamed/"));

        let renamed = state.repo.find_by_slug("renamed", true).await.unwrap().unwrap();
        assert_eq!(renamed.content(), "Updated");
        assert_eq!(renamed.id, post.id);

        let (status, _, location) = send(
            &state,
            form_request(&renamed.url(), "delete_status=1", Some(&cookie)),
        )
        .await;
        assert!(status.is_redirection());
        assert_eq!(location.as_deref(), Some("/"));
        assert!(state.repo.find_by_slug("renamed", true).await.unwrap().is_none());
        assert!(state.repo.find_by_slug("renamed", false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_with_blank_title_is_rejected() {
        let state = state().await;
        let cookie = admin_cookie(&state);

        let (status, _, _) = send(
            &state,
            form_request("/posts", "title=&tags=x&content=body", Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("3").unwrap(), 3);
        assert_eq!(parse_page("0").unwrap(), 1);
        assert!(parse_page("-1").is_err());
        assert!(parse_page("").is_err());
    }

    #[test]
    fn test_post_slug() {
        assert_eq!(post_slug("2024", "01", "02", "hello").unwrap(), "hello");
        assert_eq!(post_slug("2024", "01", "02", "café").unwrap(), "caf%c3%a9");
        assert!(post_slug("2024", "1", "02", "hello").is_err());
        assert!(post_slug("2024", "01", "02", "a.b").is_err());
    }
}
