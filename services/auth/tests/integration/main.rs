
mod login_test;
mod router_test;
mod verification_test;
