// App wiring and command dispatch.
// Builds the session, client, and loader, then runs one CLI command against them.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{AdminClient, AdminUser, BootstrapRequest, Credentials, endpoints};
use crate::auth::{self, AuthContext, Redirect, Route};
use crate::cache::{CacheStore, FileStore};
use crate::chart::{ChartDirective, Series, classify};
use crate::cli::{BootstrapArgs, Command, CredentialArgs, ListArgs, PageArgs};
use crate::config::Config;
use crate::error::{AdminError, Result};
use crate::loader::{self, LoadResult, Loader, Resource, ViewScope};
use crate::model::{PageResult, Searchable, TripItem, UserItem, Visit};
use crate::state::{DashboardView, ListView};

/// Resources that `clear-cache` removes when no resource is named.
pub const RESOURCES: &[&str] = &[
    loader::Users::NAME,
    loader::Guests::NAME,
    loader::Trips::NAME,
    loader::Dashboard::NAME,
    loader::Analytics::NAME,
];

const HEATMAP_ROWS: usize = 10;
const RECENT_GUEST_POINTS: usize = 7;

pub struct App {
    auth: Arc<AuthContext>,
    client: Arc<AdminClient>,
    loader: Loader,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn CacheStore> = Arc::new(FileStore::new(&config.cache_dir));
        let auth = Arc::new(AuthContext::with_store(Arc::clone(&store)));
        let client = Arc::new(AdminClient::new(config, auth.clone())?);
        let loader = Loader::new(client.clone(), Arc::clone(&store), config.page_limit);

        debug!(cache_dir = %config.cache_dir.display(), base_url = %config.base_url, "app ready");
        Ok(Self {
            auth,
            client,
            loader,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Signin(args) => self.sign_in(args).await,
            Command::Signup(args) => self.sign_up(args).await,
            Command::Bootstrap(args) => self.bootstrap(args).await,
            Command::Signout => {
                auth::flows::sign_out(&self.auth);
                println!("Signed out");
                Ok(())
            }
            Command::Whoami => {
                match self.auth.user() {
                    Some(user) => println!("{} ({})", user.email, user.role.as_str()),
                    None => println!("Not signed in"),
                }
                Ok(())
            }
            Command::Dashboard { refresh } => self.dashboard(refresh).await,
            Command::Users(args) => self.list::<loader::Users, UserItem>(Route::Users, args, print_user).await,
            Command::Guests(args) => self.list::<loader::Guests, Visit>(Route::Guests, args, print_visit).await,
            Command::Trips(args) => self.trips(args).await,
            Command::Trip { id } => self.trip(&id).await,
            Command::Analytics { refresh } => self.analytics(refresh).await,
            Command::CreateAdmin(args) => self.create_admin(args).await,
            Command::ClearCache { resource } => {
                self.clear_cache(resource.as_deref());
                Ok(())
            }
        }
    }

    fn mount(&self, route: Route) -> Result<ViewScope> {
        ViewScope::mount(route, &self.auth).map_err(|redirect| refusal(route, redirect))
    }

    /// Guest-only commands do nothing while a session exists.
    fn already_signed_in(&self) -> bool {
        if let Err(Redirect { .. }) = Route::Signin.guard().check(&self.auth) {
            if let Some(user) = self.auth.user() {
                println!("Already signed in as {}", user.email);
            }
            return true;
        }
        false
    }

    async fn sign_in(&self, args: CredentialArgs) -> Result<()> {
        if self.already_signed_in() {
            return Ok(());
        }
        let credentials = Credentials::new(args.email, args.password);
        let user = auth::flows::sign_in(&*self.client, &self.auth, &credentials).await?;
        print_signed_in(&user);
        Ok(())
    }

    async fn sign_up(&self, args: CredentialArgs) -> Result<()> {
        if self.already_signed_in() {
            return Ok(());
        }
        let credentials = Credentials::new(args.email, args.password);
        let user = auth::flows::sign_up(&*self.client, &self.auth, &credentials).await?;
        print_signed_in(&user);
        Ok(())
    }

    async fn bootstrap(&self, args: BootstrapArgs) -> Result<()> {
        if self.already_signed_in() {
            return Ok(());
        }
        let request = BootstrapRequest {
            email: args.email,
            password: args.password,
            secret: args.secret,
        };
        let user = auth::flows::bootstrap_super_admin(&*self.client, &self.auth, &request).await?;
        print_signed_in(&user);
        Ok(())
    }

    async fn create_admin(&self, args: CredentialArgs) -> Result<()> {
        let _scope = self.mount(Route::CreateAdmin)?;
        let credentials = Credentials::new(args.email, args.password);
        let user = auth::flows::create_admin(&*self.client, &self.auth, &credentials).await?;
        println!("Created admin {} ({})", user.email, user.role.as_str());
        Ok(())
    }

    async fn dashboard(&self, refresh: bool) -> Result<()> {
        let scope = self.mount(Route::Dashboard)?;
        let mut view = DashboardView::new();

        let ticket = view.begin();
        let result = self.load::<loader::Dashboard>(&scope, None, refresh).await;
        view.finish(ticket, result);
        if let Some(banner) = view.error.take() {
            return Err(AdminError::Other(banner));
        }

        print_fetched(view.fetched_at);
        if view.cards.is_empty() {
            println!("No metrics");
        }
        for card in &view.cards {
            println!("{}", card.label);
            print_directive(&card.directive);
        }
        Ok(())
    }

    async fn list<R, T>(&self, route: Route, args: ListArgs, print: fn(&T)) -> Result<()>
    where
        R: Resource<Payload = PageResult<T>>,
        T: Searchable,
    {
        let scope = self.mount(route)?;
        let view = self.load_page::<R, T>(&scope, &args.paging).await?;

        let rows = view.filtered(args.search.as_deref().unwrap_or(""));
        if rows.is_empty() {
            println!("No results");
        }
        for row in rows {
            print(row);
        }
        print_pager(&view, self.loader.limit());
        Ok(())
    }

    async fn trips(&self, args: PageArgs) -> Result<()> {
        let scope = self.mount(Route::Analytics)?;
        let view = self.load_page::<loader::Trips, TripItem>(&scope, &args).await?;

        if view.is_empty() {
            println!("No trips");
        }
        for trip in view.items() {
            print_trip(trip);
        }
        print_pager(&view, self.loader.limit());
        Ok(())
    }

    async fn trip(&self, id: &str) -> Result<()> {
        let _scope = self.mount(Route::Analytics)?;
        let raw = endpoints::get_trip(&*self.client, id).await?;
        match TripItem::from_detail(&raw) {
            Some(trip) => print_trip(&trip),
            None => println!("Trip {id} not found"),
        }
        Ok(())
    }

    async fn analytics(&self, refresh: bool) -> Result<()> {
        let scope = self.mount(Route::Analytics)?;
        let entry = self
            .load::<loader::Analytics>(&scope, None, refresh)
            .await
            .map_err(AdminError::Load)?;
        let snapshot = entry.payload;

        print_fetched(Some(entry.fetched_at));
        println!("Avg distance (km)   {}", snapshot.avg_distance_km());
        println!("Avg duration (min)  {}", snapshot.avg_duration_minutes());
        println!("Guest visits        {}", snapshot.total_visits());

        println!();
        println!("Trips over time");
        print_directive(&classify(&snapshot.overview.timeseries_trips));
        println!("Active users over time");
        print_directive(&classify(&snapshot.overview.timeseries_active));

        println!();
        println!("Permissions");
        for group in snapshot.permission_groups() {
            println!(
                "  {:<20} granted {:>6}  denied {:>6}",
                group.permission, group.granted, group.denied
            );
        }

        println!();
        println!("Recent guest visits");
        for point in snapshot.recent_points(RECENT_GUEST_POINTS) {
            println!("  {:<24} {}", point.time, point.count);
        }

        println!();
        println!("Busiest locations");
        for point in snapshot.top_heat_points(HEATMAP_ROWS) {
            println!("  {:<24} {}", point.label(), point.weight);
        }
        Ok(())
    }

    fn clear_cache(&self, resource: Option<&str>) {
        let removed: usize = match resource {
            Some(resource) => self.loader.invalidate(resource),
            None => RESOURCES.iter().map(|r| self.loader.invalidate(r)).sum(),
        };
        info!(removed, "cache cleared");
        println!("Removed {removed} cached entries");
    }

    async fn load<R: Resource>(
        &self,
        scope: &ViewScope,
        page: Option<u32>,
        refresh: bool,
    ) -> LoadResult<R::Payload> {
        if refresh {
            self.loader.refresh::<R>(scope, page).await
        } else {
            self.loader.load::<R>(scope, page, false).await
        }
    }

    async fn load_page<R, T>(&self, scope: &ViewScope, paging: &PageArgs) -> Result<ListView<T>>
    where
        R: Resource<Payload = PageResult<T>>,
    {
        let mut view = ListView::new();
        let ticket = view.begin(paging.page);
        let result = self.load::<R>(scope, Some(paging.page), paging.refresh).await;
        view.finish(ticket, result);
        match view.error.take() {
            Some(banner) => Err(AdminError::Other(banner)),
            None => {
                print_fetched(view.fetched_at);
                Ok(view)
            }
        }
    }
}

/// Translate a guard refusal into the error shown to the user.
fn refusal(route: Route, redirect: Redirect) -> AdminError {
    match redirect.to {
        Route::Signin => AdminError::NotSignedIn,
        _ => AdminError::Forbidden {
            view: route.title().to_string(),
        },
    }
}

fn print_fetched(fetched_at: Option<chrono::DateTime<chrono::Utc>>) {
    if let Some(at) = fetched_at {
        println!("(fetched {})", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

fn print_pager<T>(view: &ListView<T>, limit: u32) {
    println!(
        "Page {} of {} ({} total)",
        view.data.page,
        view.total_pages(limit),
        view.data.total
    );
}

fn print_signed_in(user: &AdminUser) {
    println!("Signed in as {} ({})", user.email, user.role.as_str());
}

fn print_user(user: &UserItem) {
    println!(
        "{:<4} {:<8} {:<32} {:<24} {:<9} {}",
        user.initials(),
        user.avatar_color(),
        user.email,
        user.display_name(),
        if user.is_verified { "verified" } else { "pending" },
        user.created_at
    );
}

fn print_visit(visit: &Visit) {
    println!(
        "{:<16} {:<26} {:<10} {}",
        visit.ip_address,
        visit.visit_time,
        or_dash(visit.platform.as_deref()),
        or_dash(visit.user_agent.as_deref())
    );
}

fn print_trip(trip: &TripItem) {
    println!(
        "{:<26} {:<26} {:>8.2} km {:>5} min  {:<10} {}",
        trip.trip_id,
        trip.user_id,
        trip.distance_km(),
        trip.duration_minutes(),
        trip.status,
        trip.started_at
    );
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|s| !s.is_empty()).unwrap_or("-")
}

fn print_directive(directive: &ChartDirective) {
    match directive {
        ChartDirective::Chart(series) => print_series(series),
        ChartDirective::RecentActivity(sections) => {
            for section in sections {
                println!("  {}", section.title);
                for entry in &section.entries {
                    println!(
                        "    {:<32} {:<12} {}",
                        entry.title,
                        entry.role.as_deref().unwrap_or(""),
                        entry.timestamp.as_deref().unwrap_or("")
                    );
                }
            }
        }
        ChartDirective::Scalar(text) => println!("  {text}"),
    }
}

fn print_series(series: &Series) {
    println!("  [{:?}]", series.kind);
    for (label, value) in series.labels.iter().zip(&series.data) {
        println!("  {:<20} {}", label, trim_number(*value));
    }
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}
