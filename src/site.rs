//! The stock route table: a small site that exercises every piece of the
//! framework.
//!
//! | Pattern        | Filters                      | Page                    |
//! |----------------|------------------------------|-------------------------|
//! | `/`            | find_user                    | home, greets the user   |
//! | `/user`        | find_user, require_user      | account details         |
//! | `/rebuild`     | find_user, require_role      | rebuild trigger (POST)  |
//! | `/arch/(.*)`   | none                         | archive breadcrumbs     |

use std::rc::Rc;

use tera::Context;

use crate::app::{App, Route, RouteError};
use crate::config::AppConfig;
use crate::error::{Fault, HandlerResult};
use crate::gate::FilterChain;
use crate::handler::Handler;
use crate::render::{Renderer, TeraRenderer};
use crate::request::Request;
use crate::session::User;
use crate::store::Store;

const TEMPLATES: [(&str, &str); 4] = [
    (
        "home.html",
        "<h1>Home</h1>\n\
         {% if user %}<p>Logged in as {{ user }}</p>{% else %}<p>Not logged in</p>{% endif %}",
    ),
    (
        "user.html",
        "<h1>{{ name }}</h1>\n\
         <p>{{ email }}</p>\n\
         <p>{{ count }} role{{ count | plural }}: {{ roles }}</p>",
    ),
    (
        "rebuild.html",
        "<h1>Rebuild</h1>\n\
         {% if done %}<p>Rebuild requested by {{ user }}</p>\
         {% else %}<form method=\"post\"><button>Rebuild indexes</button></form>{% endif %}",
    ),
    (
        "arch.html",
        "{% for crumb in path | splituri %}<a href=\"/{{ crumb.1 }}\">{{ crumb.0 }}</a>\
         {% if not loop.last %} / {% endif %}{% endfor %}",
    ),
];

/// Error building the stock site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A route pattern failed to compile
    #[error(transparent)]
    Route(#[from] RouteError),
    /// A template failed to parse
    #[error("templates: {0}")]
    Templates(#[from] Fault),
}

/// Builds the stock [`App`] over `store`.
pub fn build(config: &AppConfig, store: Rc<dyn Store>) -> Result<App, SiteError> {
    let renderer: Rc<dyn Renderer> = Rc::new(TeraRenderer::from_raw(TEMPLATES)?);
    let prefix = config.cookie_prefix.as_str();

    Ok(App::new(vec![
        Route::new("/", Home(renderer.clone()))?
            .filters(FilterChain::new().find_user(store.clone(), prefix)),
        Route::new("/user", Account(renderer.clone()))?.filters(
            FilterChain::new()
                .find_user(store.clone(), prefix)
                .require_user(),
        ),
        Route::new("/rebuild", Rebuild(renderer.clone()))?.filters(
            FilterChain::new()
                .find_user(store, prefix)
                .require_role(["rebuild"]),
        ),
        Route::new("/arch/(.*)", Archive(renderer))?,
    ]))
}

fn user_name(req: &Request) -> Option<&str> {
    req.user().map(User::name)
}

struct Home(Rc<dyn Renderer>);

impl Handler for Home {
    fn get(&self, req: &mut Request) -> HandlerResult {
        let mut ctx = Context::new();
        ctx.insert("user", &user_name(req));
        Ok(self.0.render("home.html", &ctx)?)
    }
}

struct Account(Rc<dyn Renderer>);

impl Handler for Account {
    fn get(&self, req: &mut Request) -> HandlerResult {
        let Some(user) = req.user() else {
            return Err(Fault::other("account page reached without a user").into());
        };
        let mut ctx = Context::new();
        ctx.insert("name", user.name());
        ctx.insert("email", user.email());
        ctx.insert("roles", user.role_string());
        ctx.insert("count", &user.roles().len());
        req.add_header("Cache-Control", "no-cache");
        Ok(self.0.render("user.html", &ctx)?)
    }
}

struct Rebuild(Rc<dyn Renderer>);

impl Handler for Rebuild {
    fn get(&self, _req: &mut Request) -> HandlerResult {
        let mut ctx = Context::new();
        ctx.insert("done", &false);
        Ok(self.0.render("rebuild.html", &ctx)?)
    }

    fn post(&self, req: &mut Request) -> HandlerResult {
        let user = user_name(req).unwrap_or("???").to_string();
        req.log().info(format_args!("rebuild requested by {}", user));
        let mut ctx = Context::new();
        ctx.insert("done", &true);
        ctx.insert("user", &user);
        Ok(self.0.render("rebuild.html", &ctx)?)
    }
}

struct Archive(Rc<dyn Renderer>);

impl Handler for Archive {
    fn get(&self, req: &mut Request) -> HandlerResult {
        let rest = req.path_param(1).unwrap_or("");
        let path = if rest.is_empty() {
            "arch".to_string()
        } else {
            format!("arch/{}", rest.trim_end_matches('/'))
        };
        let mut ctx = Context::new();
        ctx.insert("path", &path);
        Ok(self.0.render("arch.html", &ctx)?)
    }
}
