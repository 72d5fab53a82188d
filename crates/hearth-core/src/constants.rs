/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const CALENDAR_ROUTE_COMPONENT: &str = "calendar";
pub const TRAVEL_ROUTE_COMPONENT: &str = "travel";
pub const NEWS_ROUTE_COMPONENT: &str = "news";
pub const USERS_ROUTE_COMPONENT: &str = "users";
pub const HEALTHCHECK_ROUTE_COMPONENT: &str = "healthcheck";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_prefix_is_rooted() {
        assert_eq!(API_ROUTE_PREFIX, "/api");
    }
}
