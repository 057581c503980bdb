//! Expense pages: the infinite-scroll list and the create/edit forms

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;

use crate::api::error::WebError;
use crate::api::forms::{ExpenseFields, ExpenseForm, ListQuery};
use crate::api::middleware::{found, is_htmx, AppState, AuthenticatedUser, HX_LOCATION};
use crate::api::page_context;
use crate::models::{ExpenseUpdate, NewExpense, Period, User};
use crate::services::group_by_day;

/// Routes that require a session
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/create", get(new_expense_form))
        .route("/expenses/{id}/edit", get(edit_expense_form))
        .route("/expenses/{id}", post(update_expense).delete(delete_expense))
}

/// GET /expenses
///
/// htmx requests for a later page receive only the rows fragment.
async fn list_expenses(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, WebError> {
    let htmx = is_htmx(&headers);
    let offset = query.offset();
    let now = Utc::now();

    let page = state.expense_service.list_page(offset).await?;
    let continues_from = if offset > 0 { query.day() } else { None };
    let mut groups = group_by_day(&page.items, &state.catalog, now, continues_from);
    state.expense_service.fill_day_totals(&mut groups).await?;
    let last_date = groups.last().map(|g| g.date.clone());

    let mut ctx = page_context("Expenses", "expenses", Some(&user));
    ctx.insert("groups", &groups);
    ctx.insert("has_more", &page.has_more);
    ctx.insert("next_offset", &page.next_offset);
    ctx.insert("last_date", &last_date);

    if htmx && offset > 0 {
        let html = state.views.render("expenses/rows.html", &ctx)?;
        return Ok(Html(html).into_response());
    }

    let month_total = state.expense_service.current_month_total().await?;
    ctx.insert("month_total", &month_total);
    ctx.insert("month_label", &Period::month_of(now).label());

    let html = state.views.render_page("expenses/list.html", &ctx, htmx)?;
    Ok(Html(html).into_response())
}

/// GET /expenses/create
async fn new_expense_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let form = ExpenseForm::blank(Utc::now());
    render_form(&state, &user, &headers, StatusCode::OK, None, &form, None)
}

/// POST /expenses
async fn create_expense(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, WebError> {
    let fields = match form.parse() {
        Ok(fields) => fields,
        Err(msg) => {
            return render_form(&state, &user, &headers, StatusCode::BAD_REQUEST, None, &form, Some(&msg));
        }
    };

    let ExpenseFields {
        amount,
        description,
        category,
        date,
    } = fields;
    let expense = state
        .expense_service
        .create(NewExpense {
            amount,
            description,
            category,
            date: Some(date),
            user_id: Some(user.id),
        })
        .await?;

    tracing::info!("User {} recorded expense {}", user.id, expense.id);
    Ok(back_to_list(&headers))
}

/// GET /expenses/{id}/edit
async fn edit_expense_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let expense = state
        .expense_service
        .get(id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Expense {} does not exist", id)))?;

    let form = ExpenseForm::from_expense(&expense);
    render_form(&state, &user, &headers, StatusCode::OK, Some(id), &form, None)
}

/// POST /expenses/{id}
async fn update_expense(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, WebError> {
    let fields = match form.parse() {
        Ok(fields) => fields,
        Err(msg) => {
            return render_form(&state, &user, &headers, StatusCode::BAD_REQUEST, Some(id), &form, Some(&msg));
        }
    };

    state
        .expense_service
        .update(
            id,
            ExpenseUpdate {
                amount: fields.amount,
                description: fields.description,
                category: fields.category,
                date: fields.date,
            },
        )
        .await?;

    tracing::info!("User {} updated expense {}", user.id, id);
    Ok(back_to_list(&headers))
}

/// DELETE /expenses/{id}
async fn delete_expense(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    state.expense_service.delete(id).await?;

    tracing::info!("User {} deleted expense {}", user.id, id);
    Ok(back_to_list(&headers))
}

/// htmx gets `HX-Location`; a plain form post is redirected.
fn back_to_list(headers: &HeaderMap) -> Response {
    if is_htmx(headers) {
        let location = serde_json::json!({ "path": "/expenses", "target": "#content" });
        (StatusCode::OK, [(HX_LOCATION, location.to_string())]).into_response()
    } else {
        found("/expenses")
    }
}

fn render_form(
    state: &AppState,
    user: &User,
    headers: &HeaderMap,
    status: StatusCode,
    expense_id: Option<i64>,
    form: &ExpenseForm,
    error: Option<&str>,
) -> Result<Response, WebError> {
    let title = if expense_id.is_some() { "Edit expense" } else { "New expense" };
    let action = match expense_id {
        Some(id) => format!("/expenses/{}", id),
        None => "/expenses".to_string(),
    };

    let mut ctx = page_context(title, "expenses", Some(user));
    ctx.insert("expense_id", &expense_id);
    ctx.insert("action", &action);
    ctx.insert("form", form);
    ctx.insert("categories", state.catalog.entries());
    ctx.insert("error", &error);

    let html = state
        .views
        .render_page("expenses/form.html", &ctx, is_htmx(headers))?;
    Ok((status, Html(html)).into_response())
}
