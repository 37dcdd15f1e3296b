// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Handlers behind every subcommand.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use optrack::api::products::{recent_products, sort_newest_first, RECENT_PRODUCTS};
use optrack::api::teams::{dashboard_teams, team_name};
use optrack::api::{login_error_message, ApiClient};
use optrack::config::{self, AppConfig};
use optrack::dates::format_for_display;
use optrack::error::{ApiError, ErrorBuilder};
use optrack::export::{format_cop, OpReport};
use optrack::pagination::Paginator;
use optrack::session::CredentialStore;
use optrack::sizes::{SizeSheet, SizeSummary};
use optrack::types::{LoadLevel, Product, ReportSchedule, Team, TeamRef, User, NOT_AVAILABLE};
use optrack::utils::mask_sensitive;
use optrack::validation::{
    check_user_deletable, validate_date_range, ProductForm, ScheduleForm, TeamForm, UserForm,
    ValidationErrors,
};

use super::args::{
    Commands, ConfigCommands, ProductCommands, ProductFields, ReportCommands, ScheduleCommands,
    TeamCommands, TeamFields, UserCommands,
};
use super::spinner;
use super::table::Table;

/// Returned when a command needs a session and none is stored.
#[derive(Debug, Error)]
#[error("not logged in")]
pub struct NotLoggedIn;

/// A validation failure with the form it came from.
#[derive(Debug, Error)]
#[error("{title}: {errors}")]
pub struct InvalidInput {
    pub title: &'static str,
    pub errors: ValidationErrors,
}

/// The user declined a confirmation prompt.
#[derive(Debug, Error)]
#[error("cancelled")]
pub struct Cancelled;

/// Everything a handler needs.
pub struct AppContext {
    pub config: AppConfig,
    pub client: ApiClient,
    pub store: Arc<dyn CredentialStore>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = ApiClient::new(&config, store.clone())?;
        Ok(Self { config, client, store })
    }

    fn require_login(&self) -> Result<()> {
        if self.store.is_authenticated() {
            Ok(())
        } else {
            Err(NotLoggedIn.into())
        }
    }
}

fn invalid(title: &'static str, errors: ValidationErrors) -> anyhow::Error {
    InvalidInput { title, errors }.into()
}

/// Render any command failure for the terminal.
pub fn render_error(err: &anyhow::Error) -> String {
    if err.downcast_ref::<NotLoggedIn>().is_some() {
        return ErrorBuilder::new("You are not logged in")
            .fix("Log in first: optrack login")
            .build();
    }
    if let Some(InvalidInput { title, errors }) = err.downcast_ref::<InvalidInput>() {
        let mut out = format!("[✗] {}\n", title);
        for e in errors.errors() {
            out.push_str(&format!("  - {}: {}\n", e.field, e.message));
        }
        return out;
    }
    if let Some(api) = err.downcast_ref::<ApiError>() {
        let title = err.to_string();
        let title = if title == api.to_string() { "Request failed".to_string() } else { title };
        return api.report(&title).build();
    }
    let mut builder = ErrorBuilder::new(err.to_string());
    for cause in err.chain().skip(1) {
        builder = builder.cause(cause.to_string());
    }
    builder.build()
}

/// Dispatch one parsed command. `Shell` is handled by the caller.
pub async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { user } => login(ctx, user).await,
        Commands::Logout => {
            ctx.client.logout();
            println!("{} Logged out.", "[OK]".green());
            Ok(())
        }
        Commands::Whoami => whoami(ctx).await,
        Commands::Search { op, export } => search(ctx, op, export.as_deref()).await,
        Commands::Products(cmd) => products(ctx, cmd).await,
        Commands::Teams(cmd) => teams(ctx, cmd).await,
        Commands::Users(cmd) => users(ctx, cmd).await,
        Commands::Reports(cmd) => reports(ctx, cmd).await,
        Commands::Config(cmd) => config_command(ctx, cmd),
        Commands::Shell => {
            println!("Already in the shell.");
            Ok(())
        }
    }
}

// ============================================================================
// AUTH
// ============================================================================

/// Prompt for credentials and log in. The token lands in the credential store.
pub async fn login(ctx: &AppContext, user: Option<String>) -> Result<()> {
    let user = match user {
        Some(user) => user,
        None => Text::new("User name:").prompt().context("Login cancelled")?,
    };
    let password = Password::new("Password:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Login cancelled")?;

    if user.trim().is_empty() || password.is_empty() {
        return Err(invalid(
            "Login failed",
            ValidationErrors::single("credentials", "user name and password are required"),
        ));
    }

    let sp = spinner::create("Logging in...");
    match ctx.client.login(user.trim(), &password).await {
        Ok(credentials) => {
            spinner::finish_success(&sp, &format!("Logged in as {}", user.trim()));
            tracing::debug!("Session token {}", mask_sensitive(&credentials.token, 6));
            Ok(())
        }
        Err(e) => {
            spinner::clear(&sp);
            let message = login_error_message(&e);
            Err(anyhow::Error::new(e).context(format!("Login failed: {}", message)))
        }
    }
}

async fn whoami(ctx: &AppContext) -> Result<()> {
    ctx.require_login()?;
    let user = ctx.client.current_user().await.context("Could not load the current user")?;
    println!("{} <{}>  role: {}", user.name.bold(), user.email, role_label(&user));
    println!("API: {}", ctx.client.base_url());
    Ok(())
}

fn role_label(user: &User) -> &'static str {
    user.role.unwrap_or_default().label()
}

// ============================================================================
// SEARCH / EXPORT
// ============================================================================

async fn search(ctx: &AppContext, op: Option<i64>, export: Option<&Path>) -> Result<()> {
    ctx.require_login()?;

    let Some(op) = op else {
        let all = ctx.client.list_products().await.context("Could not load products")?;
        let recent = recent_products(&all, RECENT_PRODUCTS);
        println!("{}", format!("Last {} products", recent.len()).bold());
        print_products(&recent);
        return Ok(());
    };

    let op = op.to_string();
    let results: Vec<Product> = ctx
        .client
        .products_by_op(&op)
        .await
        .with_context(|| format!("Could not search OP {}", op))?
        .into_iter()
        .map(Product::normalized)
        .collect();

    let Some(selected) = results.first() else {
        println!("No products found for OP {}.", op);
        return Ok(());
    };

    print_products(&results);
    println!();
    println!("{}", format!("Sizes for OP {} ({})", selected.op_label(), selected.team_name()).bold());
    print_size_summary(selected);

    if let Some(dir) = export {
        let path = OpReport::from_product(selected)
            .write_to(dir)
            .with_context(|| format!("Could not write the report to {}", dir.display()))?;
        println!("{} Exported {}", "[OK]".green(), path.display());
    }
    Ok(())
}

fn print_size_summary(product: &Product) {
    let summary = product
        .size_quantities
        .as_ref()
        .map(SizeSummary::from_quantities)
        .unwrap_or_default();
    if summary.is_empty() {
        println!("  (no sizes recorded)");
        return;
    }
    let mut table = Table::new(["Size", "Quantity"]);
    for row in &summary.rows {
        table.row([row.size.clone(), row.quantity.to_string()]);
    }
    table.row(["Total".to_string(), summary.total.to_string()]);
    println!("{}", table);
}

// ============================================================================
// PRODUCTS
// ============================================================================

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    let mut table = Table::new(["ID", "OP", "Reference", "Brand", "Team", "Qty", "Assigned", "Entry", "Status"]);
    for p in products {
        table.row([
            p.id.to_string(),
            p.op_label().to_string(),
            p.reference.clone().unwrap_or_else(|| NOT_AVAILABLE.into()),
            p.brand.clone().unwrap_or_else(|| NOT_AVAILABLE.into()),
            p.team_name(),
            p.quantity.unwrap_or(0).to_string(),
            format_for_display(p.assigned_date.as_deref()),
            format_for_display(p.plant_entry_date.as_deref()),
            p.status.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}

fn print_page_footer(pager: &Paginator) {
    let pages: Vec<String> = pager
        .visible_pages()
        .into_iter()
        .map(|p| if p == pager.current_page() { format!("[{}]", p) } else { p.to_string() })
        .collect();
    println!("{}   pages: {}", pager.summary().dimmed(), pages.join(" "));
}

async fn products(ctx: &AppContext, cmd: ProductCommands) -> Result<()> {
    ctx.require_login()?;
    match cmd {
        ProductCommands::List { search, page, per_page } => {
            let term = search.unwrap_or_default();
            let mut list = ctx
                .client
                .search_products(&term)
                .await
                .context("Could not load products")?;
            sort_newest_first(&mut list);

            let mut pager = Paginator::new(list.len(), per_page);
            if page != 1 && !pager.go_to(page) {
                println!("Page {} does not exist (1-{}).", page, pager.total_pages().max(1));
                return Ok(());
            }
            print_products(pager.page_items(&list));
            print_page_footer(&pager);
            Ok(())
        }
        ProductCommands::Show { id } => {
            let product = ctx
                .client
                .get_product(id)
                .await
                .with_context(|| format!("Could not load product {}", id))?;
            print!("{}", OpReport::from_product(&product).render());
            Ok(())
        }
        ProductCommands::ByTeam { team_id } => {
            let mut list = ctx
                .client
                .products_by_team(team_id)
                .await
                .with_context(|| format!("Could not load products of team {}", team_id))?;
            sort_newest_first(&mut list);
            print_products(&list);
            Ok(())
        }
        ProductCommands::Add(fields) => {
            let team = resolve_team(ctx, fields.team).await?;
            let mut form = ProductForm::default();
            apply_product_fields(&mut form, &fields, team)?;
            let payload = form.validate_new().map_err(|e| invalid("Invalid product", e))?;
            ctx.client.create_product(&payload).await.context("Could not create the product")?;
            println!("{} Product for OP {} created ({} garments).", "[OK]".green(), payload.op, payload.quantity);
            Ok(())
        }
        ProductCommands::Edit { id, fields } => {
            let current = ctx
                .client
                .get_product(id)
                .await
                .with_context(|| format!("Could not load product {}", id))?;
            let team = match fields.team {
                Some(team_id) => resolve_team(ctx, Some(team_id)).await?,
                None => current.assigned_team().and_then(team_from_ref),
            };
            let mut form = product_form_from(&current);
            apply_product_fields(&mut form, &fields, team)?;
            let payload = form.validate_update(id).map_err(|e| invalid("Invalid product", e))?;
            ctx.client
                .update_product(id, &payload)
                .await
                .with_context(|| format!("Could not update product {}", id))?;
            println!("{} Product {} updated.", "[OK]".green(), id);
            Ok(())
        }
        ProductCommands::Delete { id, yes } => {
            confirm(yes, &format!("Delete product {}?", id))?;
            ctx.client
                .delete_product(id)
                .await
                .with_context(|| format!("Could not delete product {}", id))?;
            println!("{} Product {} deleted.", "[OK]".green(), id);
            Ok(())
        }
    }
}

async fn resolve_team(ctx: &AppContext, team_id: Option<i64>) -> Result<Option<Team>> {
    match team_id {
        Some(id) => {
            let team = ctx
                .client
                .get_team(id)
                .await
                .with_context(|| format!("Could not load team {}", id))?;
            Ok(Some(team))
        }
        None => Ok(None),
    }
}

fn team_from_ref(team: &TeamRef) -> Option<Team> {
    match team {
        TeamRef::Team(team) => Some(team.clone()),
        TeamRef::Name(_) => None,
    }
}

fn product_form_from(p: &Product) -> ProductForm {
    ProductForm {
        description: p.description.clone().unwrap_or_default(),
        price: p.price,
        assigned_date: p.assigned_date.clone().unwrap_or_default(),
        plant_entry_date: p.plant_entry_date.clone().unwrap_or_default(),
        reference: p.reference.clone().unwrap_or_default(),
        brand: p.brand.clone().unwrap_or_default(),
        op: p.op.clone().unwrap_or_default(),
        campaign: p.campaign.clone().unwrap_or_default(),
        product_type: p.product_type.clone().unwrap_or_default(),
        team: None,
        sam: p.sam,
        sizes: p.size_quantities.as_ref().map(SizeSheet::from_quantities).unwrap_or_default(),
        stoppage_reason: p.stoppage_reason.clone().unwrap_or_default(),
        status: p.status.clone().unwrap_or_default(),
        actual_delivery_date: p.actual_delivery_date.clone().unwrap_or_default(),
        quantity_made: p.quantity_made.unwrap_or(0),
    }
}

fn apply_product_fields(form: &mut ProductForm, fields: &ProductFields, team: Option<Team>) -> Result<()> {
    fn set(target: &mut String, value: &Option<String>) {
        if let Some(v) = value {
            *target = v.clone();
        }
    }

    if let Some(op) = fields.op {
        form.op = op.to_string();
    }
    set(&mut form.reference, &fields.reference);
    set(&mut form.brand, &fields.brand);
    set(&mut form.campaign, &fields.campaign);
    set(&mut form.product_type, &fields.product_type);
    set(&mut form.description, &fields.description);
    set(&mut form.assigned_date, &fields.assigned);
    set(&mut form.plant_entry_date, &fields.entry);
    set(&mut form.status, &fields.status);
    set(&mut form.stoppage_reason, &fields.stoppage_reason);
    set(&mut form.actual_delivery_date, &fields.delivered);
    if fields.price.is_some() {
        form.price = fields.price;
    }
    if fields.sam.is_some() {
        form.sam = fields.sam;
    }
    if let Some(made) = fields.quantity_made {
        form.quantity_made = made;
    }
    if team.is_some() {
        form.team = team;
    }

    let mut size_errors = ValidationErrors::new();
    for entry in &fields.sizes {
        if let Err(e) = form.sizes.apply_entry(entry) {
            size_errors.push("sizes", e.to_string());
        }
    }
    if size_errors.is_empty() {
        Ok(())
    } else {
        Err(invalid("Invalid sizes", size_errors))
    }
}

fn confirm(yes: bool, question: &str) -> Result<()> {
    if yes {
        return Ok(());
    }
    let answer = Confirm::new(question)
        .with_default(false)
        .prompt()
        .context("Confirmation aborted")?;
    if answer {
        Ok(())
    } else {
        Err(Cancelled.into())
    }
}

// ============================================================================
// TEAMS
// ============================================================================

fn colored_level(level: LoadLevel) -> String {
    let label = level.to_string();
    match level {
        LoadLevel::Critical => label.red().bold().to_string(),
        LoadLevel::Low => label.yellow().to_string(),
        LoadLevel::OnTrack => label.green().to_string(),
        LoadLevel::Overloaded => label.blue().bold().to_string(),
    }
}

fn gauge(team: &Team) -> String {
    let filled = team.gauge_value().round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(5 - filled.min(5)))
}

async fn teams(ctx: &AppContext, cmd: TeamCommands) -> Result<()> {
    ctx.require_login()?;
    match cmd {
        TeamCommands::List => {
            let teams = ctx.client.list_teams().await.context("Could not load teams")?;
            let mut table = Table::new(["ID", "Team", "Persons", "Load days", "Gauge", "Level"]);
            for team in dashboard_teams(&teams) {
                table.row([
                    team.id.to_string(),
                    team.name.clone(),
                    team.num_persons.to_string(),
                    format!("{:.2}", team.load_days.unwrap_or(0.0)),
                    gauge(team),
                    colored_level(team.load_level()),
                ]);
            }
            if table.is_empty() {
                println!("No teams.");
            } else {
                println!("{}", table);
            }
            Ok(())
        }
        TeamCommands::Show { id } => {
            let team = ctx.client.get_team(id).await.with_context(|| format!("Could not load team {}", id))?;
            println!("{} (#{})", team.name.bold(), team.id);
            if let Some(description) = team.description.as_deref().filter(|d| !d.is_empty()) {
                println!("  {}", description);
            }
            println!("  Persons:    {}", team.num_persons);
            println!("  Load days:  {:.2} {}", team.load_days.unwrap_or(0.0), gauge(&team));
            println!("  Total days: {:.2}", team.total_days.unwrap_or(0.0));
            println!("  Level:      {}", colored_level(team.load_level()));
            Ok(())
        }
        TeamCommands::Add(fields) => {
            let form = team_form(TeamForm::default(), &fields);
            let payload = form.validate(None).map_err(|e| invalid("Invalid team", e))?;
            ctx.client.create_team(&payload).await.context("Could not create the team")?;
            println!("{} Team {} created.", "[OK]".green(), payload.name);
            Ok(())
        }
        TeamCommands::Edit { id, fields } => {
            let current = ctx.client.get_team(id).await.with_context(|| format!("Could not load team {}", id))?;
            let base = TeamForm {
                name: current.name,
                description: current.description.unwrap_or_default(),
                num_persons: current.num_persons,
            };
            let payload = team_form(base, &fields)
                .validate(Some(id))
                .map_err(|e| invalid("Invalid team", e))?;
            ctx.client
                .update_team(id, &payload)
                .await
                .with_context(|| format!("Could not update team {}", id))?;
            println!("{} Team {} updated.", "[OK]".green(), id);
            Ok(())
        }
    }
}

fn team_form(mut form: TeamForm, fields: &TeamFields) -> TeamForm {
    if let Some(name) = &fields.name {
        form.name = name.clone();
    }
    if let Some(description) = &fields.description {
        form.description = description.clone();
    }
    if let Some(persons) = fields.persons {
        form.num_persons = persons;
    }
    form
}

// ============================================================================
// USERS
// ============================================================================

fn prompt_password(label: &str) -> Result<String> {
    Password::new(label)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Password entry cancelled")
}

async fn users(ctx: &AppContext, cmd: UserCommands) -> Result<()> {
    ctx.require_login()?;
    match cmd {
        UserCommands::List => {
            let users = ctx.client.list_users().await.context("Could not load users")?;
            let mut table = Table::new(["ID", "User", "E-mail", "Role"]);
            for user in &users {
                table.row([user.id.to_string(), user.name.clone(), user.email.clone(), role_label(user).to_string()]);
            }
            println!("{}", table);
            Ok(())
        }
        UserCommands::Add { name, email, role } => {
            let existing = ctx.client.list_users().await.context("Could not load users")?;
            let password = prompt_password("Password:")?;
            let form = UserForm { name, email, password, confirm_password: None, role: Some(role) };
            let payload = form.validate_new(&existing).map_err(|e| invalid("Invalid user", e))?;
            ctx.client.create_user(&payload).await.context("Could not create the user")?;
            println!("{} User {} created.", "[OK]".green(), payload.name);
            Ok(())
        }
        UserCommands::Edit { id, name, email, role, password } => {
            let existing = ctx.client.list_users().await.context("Could not load users")?;
            let current = existing
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("User {} does not exist", id))?;
            let (password, confirm_password) = if password {
                let new = prompt_password("New password:")?;
                let again = prompt_password("Confirm password:")?;
                (new, Some(again))
            } else {
                (String::new(), None)
            };
            let form = UserForm {
                name: name.unwrap_or(current.name),
                email: email.unwrap_or(current.email),
                password,
                confirm_password,
                role: role.or(current.role),
            };
            let payload = form.validate_update(id, &existing).map_err(|e| invalid("Invalid user", e))?;
            ctx.client
                .update_user(id, &payload)
                .await
                .with_context(|| format!("Could not update user {}", id))?;
            println!("{} User {} updated.", "[OK]".green(), id);
            Ok(())
        }
        UserCommands::Delete { id, yes } => {
            let me = match ctx.client.current_user().await {
                Ok(user) => Some(user.id),
                Err(e) => {
                    tracing::warn!("Could not resolve the current user: {}", e);
                    None
                }
            };
            check_user_deletable(id, me).map_err(|e| invalid("Cannot delete user", e))?;
            confirm(yes, &format!("Delete user {}?", id))?;
            ctx.client
                .delete_user(id)
                .await
                .with_context(|| format!("Could not delete user {}", id))?;
            println!("{} User {} deleted.", "[OK]".green(), id);
            Ok(())
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

fn report_team_name(product: &Product, teams: &[Team]) -> String {
    match product.assigned_team() {
        Some(TeamRef::Team(team)) if !team.name.is_empty() => team.name.clone(),
        Some(TeamRef::Team(team)) => team_name(teams, team.id).to_string(),
        Some(TeamRef::Name(name)) => name.clone(),
        None => NOT_AVAILABLE.to_string(),
    }
}

async fn reports(ctx: &AppContext, cmd: ReportCommands) -> Result<()> {
    ctx.require_login()?;
    match cmd {
        ReportCommands::Range { start, end, team, page, per_page } => {
            let (start, end) = validate_date_range(start.as_deref(), end.as_deref())
                .map_err(|e| invalid("Invalid date range", e))?;
            let teams = ctx.client.list_teams().await.context("Could not load teams")?;
            let rows = ctx
                .client
                .date_range_report(start, end, team)
                .await
                .context("Could not load the report")?;

            let mut pager = Paginator::new(rows.len(), per_page);
            if page != 1 && !pager.go_to(page) {
                println!("Page {} does not exist (1-{}).", page, pager.total_pages().max(1));
                return Ok(());
            }

            let mut table = Table::new(["OP", "Reference", "Team", "Assigned", "Entry", "Qty", "Price", "Status"]);
            for p in pager.page_items(&rows) {
                table.row([
                    p.op_label().to_string(),
                    p.reference.clone().unwrap_or_else(|| NOT_AVAILABLE.into()),
                    report_team_name(p, &teams),
                    format_for_display(p.assigned_date.as_deref()),
                    format_for_display(p.plant_entry_date.as_deref()),
                    p.quantity.unwrap_or(0).to_string(),
                    p.price.map(format_cop).unwrap_or_default(),
                    p.status.clone().unwrap_or_default(),
                ]);
            }
            if table.is_empty() {
                println!("No products assigned between {} and {}.", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"));
            } else {
                println!("{}", table);
                print_page_footer(&pager);
            }
            Ok(())
        }
        ReportCommands::Schedule(cmd) => schedules(ctx, cmd).await,
    }
}

fn print_schedules(schedules: &[ReportSchedule]) {
    let mut table = Table::new(["ID", "Date", "Time", "Recipient", "Created"]);
    for s in schedules {
        table.row([
            s.id.map(|id| id.to_string()).unwrap_or_default(),
            format_for_display(Some(s.send_date.as_str())),
            s.send_time.clone(),
            s.recipient_email.clone(),
            format_for_display(s.created_at.as_deref()),
        ]);
    }
    if table.is_empty() {
        println!("No scheduled reports.");
    } else {
        println!("{}", table);
    }
}

async fn schedules(ctx: &AppContext, cmd: ScheduleCommands) -> Result<()> {
    match cmd {
        ScheduleCommands::List => {
            let list = ctx.client.list_schedules().await.context("Could not load report schedules")?;
            print_schedules(&list);
            Ok(())
        }
        ScheduleCommands::Show { id } => {
            let schedule = ctx
                .client
                .get_schedule(id)
                .await
                .with_context(|| format!("Could not load report schedule {}", id))?;
            print_schedules(std::slice::from_ref(&schedule));
            Ok(())
        }
        ScheduleCommands::Add { date, time, email } => {
            let form = ScheduleForm { send_date: date, send_time: time, recipient_email: email };
            let schedule = form.validate(None).map_err(|e| invalid("Invalid schedule", e))?;
            ctx.client.schedule_report(&schedule).await.context("Could not schedule the report")?;
            println!(
                "{} Report scheduled for {} {} to {}.",
                "[OK]".green(),
                format_for_display(Some(schedule.send_date.as_str())),
                schedule.send_time,
                schedule.recipient_email
            );
            Ok(())
        }
        ScheduleCommands::Edit { id, date, time, email } => {
            let current = ctx
                .client
                .get_schedule(id)
                .await
                .with_context(|| format!("Could not load report schedule {}", id))?;
            let form = ScheduleForm {
                send_date: date.unwrap_or(current.send_date),
                send_time: time.unwrap_or(current.send_time),
                recipient_email: email.unwrap_or(current.recipient_email),
            };
            let schedule = form.validate(Some(id)).map_err(|e| invalid("Invalid schedule", e))?;
            ctx.client
                .update_schedule(id, &schedule)
                .await
                .with_context(|| format!("Could not update report schedule {}", id))?;
            println!("{} Report schedule {} updated.", "[OK]".green(), id);
            Ok(())
        }
        ScheduleCommands::Delete { id, yes } => {
            confirm(yes, &format!("Delete report schedule {}?", id))?;
            ctx.client
                .delete_schedule(id)
                .await
                .with_context(|| format!("Could not delete report schedule {}", id))?;
            println!("{} Report schedule {} deleted.", "[OK]".green(), id);
            Ok(())
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

fn config_command(ctx: &AppContext, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let path = config::config_path()?;
            println!("{}", "Configuration".bold());
            println!("  File:            {}", path.display());
            println!("  API URL:         {}", ctx.config.api_url);
            println!("  Request timeout: {}s", ctx.config.request_timeout_secs);
            println!("  Warn after:      {}s idle", ctx.config.session.warning_after_secs);
            println!("  Auto logout:     {}s after warning", ctx.config.session.auto_logout_after_secs);
            println!("  Poll interval:   {}s", ctx.config.session.poll_interval_secs);
            let session = if ctx.store.is_authenticated() {
                format!("logged in as {}", ctx.store.user_name().unwrap_or_else(|| "?".into()))
            } else {
                "not logged in".to_string()
            };
            println!("  Session:         {}", session);
            Ok(())
        }
        ConfigCommands::SetApiUrl { url } => {
            let url = config::normalize_api_url(&url)?;
            // Save the file's own settings, not the env/flag overrides.
            let mut stored = config::load_config()?;
            stored.api_url = url.clone();
            config::save_config(&stored)?;
            println!("{} API URL set to {}", "[OK]".green(), url);
            Ok(())
        }
    }
}
