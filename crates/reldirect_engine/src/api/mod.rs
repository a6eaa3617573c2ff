/* 📖 # Why an API module in reldirect_engine?

The api module adapts the resolver to the PAL's HttpService trait, so it can be
served by RealPal (tiny_http) in production and driven through MockPal in tests.
*/

mod redirect_service;

pub use redirect_service::RedirectService;
