pub mod company_route;
pub mod default_route;
pub mod email_route;
