//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Book catalog and loan management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        health::health_check,
        // Books
        books::get_book,
        books::list_books,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::get_book_loans,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::list_loans,
    ),
    components(
        schemas(
            crate::models::book::BookDto,
            crate::models::loan::LoanDto,
            crate::models::loan::CreateLoanRequest,
            crate::models::loan::ReturnLoanRequest,
            crate::models::page::Pageable,
            crate::models::page::BookPage,
            crate::models::page::LoanPage,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "books", description = "Book catalog"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/swagger-ui`, document at `/api-docs/openapi.json`
pub fn create_openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
