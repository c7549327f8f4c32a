//! End-to-end offline scenarios
//!
//! Each test drives a full deploy/fetch cycle through `OfflineHarness`
//! against the scripted network.

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::sync::Arc;

    use asubt_runtime::service_worker::{
        CacheStorage, FetchSource, OfflineConfig, Request, RequestMethod, Response,
        ServiceWorkerState,
    };

    use crate::assertions::*;
    use crate::fixtures::AppFixtures;
    use crate::harness::{OfflineHarness, Served};

    fn deployed(cache_name: &str) -> OfflineHarness {
        let mut h = OfflineHarness::new();
        h.deploy(cache_name).unwrap();
        h
    }

    #[test]
    fn test_first_load_then_offline_shell() {
        let h = deployed("asubt-v6");
        {
            let storage = h.container().storage().read();
            assert!(storage.match_in("asubt-v6", &Request::new(AppFixtures::url("/"))).is_some());
            assert!(storage
                .match_in("asubt-v6", &Request::new(AppFixtures::url("/index.html")))
                .is_some());
        }

        h.go_offline();
        let (response, served) = h.navigate("/").unwrap();
        assert_eq!(served, Served::Worker(FetchSource::Cache));
        assert_eq!(response.status, 200);
        assert_eq!(response.text(), AppFixtures::shell_html());
    }

    #[test]
    fn test_version_bump_purges_old_cache() {
        let mut h = deployed("asubt-v5");
        let asset = Request::new(AppFixtures::url("/assets/index.js"));
        assert_source(&h.dispatch(asset.clone()), FetchSource::Network).unwrap();
        assert!(h.container().storage().read().match_in("asubt-v5", &asset).is_some());

        h.deploy("asubt-v6").unwrap();
        assert_eq!(
            h.container().storage().read().keys(),
            ["asubt-v6".to_string()]
        );

        // the asset only lived in the purged store
        h.go_offline();
        let result = h.dispatch(asset);
        assert_source(&result, FetchSource::Offline).unwrap();
        assert_status(&result, 503).unwrap();
    }

    #[test]
    fn test_font_served_from_cache_on_repeat() {
        let h = deployed("asubt-v6");
        let font = Request::new(AppFixtures::FONT_URL);

        let first = h.dispatch(font.clone());
        assert_source(&first, FetchSource::Network).unwrap();
        let second = h.dispatch(font);
        assert_source(&second, FetchSource::Cache).unwrap();

        assert_eq!(h.network().calls_to(AppFixtures::FONT_URL), 1);
        assert_same_response(
            &first.into_response().unwrap().response,
            &second.into_response().unwrap().response,
        )
        .unwrap();
    }

    #[test]
    fn test_font_offline_without_cache() {
        let h = deployed("asubt-v6");
        h.go_offline();
        let result = h.dispatch(Request::new(AppFixtures::FONT_CSS_URL));
        assert_source(&result, FetchSource::Offline).unwrap();
        assert_status(&result, 503).unwrap();
        assert!(result.into_response().unwrap().response.body.is_empty());
    }

    #[test]
    fn test_api_error_returned_unchanged_and_not_cached() {
        let h = deployed("asubt-v6");
        let not_found = Response::new(404)
            .with_header("Content-Type", "application/json")
            .with_body(&br#"{"error":"no such audit"}"#[..]);
        h.network().route(AppFixtures::API_URL, not_found.clone());

        let result = h.dispatch(Request::new(AppFixtures::API_URL));
        assert_source(&result, FetchSource::Network).unwrap();
        assert_same_response(&result.into_response().unwrap().response, &not_found).unwrap();
        assert!(h
            .container()
            .storage()
            .read()
            .match_in("asubt-v6", &Request::new(AppFixtures::API_URL))
            .is_none());

        h.go_offline();
        let offline = h.dispatch(Request::new(AppFixtures::API_URL));
        assert_source(&offline, FetchSource::Offline).unwrap();
        assert_content_type(
            &offline.into_response().unwrap().response,
            "text/plain; charset=utf-8",
        )
        .unwrap();
    }

    #[test]
    fn test_api_data_available_offline_after_success() {
        let h = deployed("asubt-v6");
        h.network().route(AppFixtures::API_URL, AppFixtures::audits_json());
        h.dispatch(Request::new(AppFixtures::API_URL));

        h.go_offline();
        let (response, served) = h.load(Request::new(AppFixtures::API_URL)).unwrap();
        assert_eq!(served, Served::Worker(FetchSource::Cache));
        assert_same_response(&response, &AppFixtures::audits_json()).unwrap();
    }

    #[test]
    fn test_non_get_bypasses_worker() {
        let h = deployed("asubt-v6");
        let usage = h.container().storage().read().usage();
        let post = Request::new(AppFixtures::API_URL)
            .with_method(RequestMethod::Post)
            .with_body(&br#"{"status":"closed"}"#[..]);

        assert_passthrough(&h.dispatch(post.clone())).unwrap();
        assert_eq!(h.network().calls_to(AppFixtures::API_URL), 0);

        let (_, served) = h.load(post).unwrap();
        assert_eq!(served, Served::Bypassed);
        assert_eq!(h.network().calls_to(AppFixtures::API_URL), 1);
        assert_eq!(h.container().storage().read().usage(), usage);
    }

    #[test]
    fn test_extension_request_bypasses_worker() {
        let h = deployed("asubt-v6");
        let calls = h.network().call_count();
        assert_passthrough(&h.dispatch(Request::new("chrome-extension://abcdef/content.js")))
            .unwrap();
        assert_eq!(h.network().call_count(), calls);
    }

    #[test]
    fn test_offline_navigation_falls_back_to_shell() {
        let h = deployed("asubt-v6");
        h.go_offline();
        let (response, served) = h.navigate("/pab/audits?page=2").unwrap();
        assert_eq!(served, Served::Worker(FetchSource::Cache));
        assert_eq!(response.header("X-Shell-Path"), Some("/"));
    }

    #[test]
    fn test_offline_navigation_without_cache() {
        let mut h = OfflineHarness::new();
        h.go_offline();
        h.deploy("asubt-v6").unwrap();
        assert!(h.container().active().unwrap().is_serving());

        let (response, served) = h.navigate("/").unwrap();
        assert_eq!(served, Served::Worker(FetchSource::Offline));
        assert_eq!(response.status, 503);
        assert_content_type(&response, "text/html; charset=utf-8").unwrap();
        assert!(response.text().contains("Офлайн режим"));
    }

    #[test]
    fn test_fragment_ignored_when_matching() {
        let h = deployed("asubt-v6");
        h.go_offline();
        let result = h.dispatch(Request::new(AppFixtures::url("/index.html#top")));
        assert_source(&result, FetchSource::Cache).unwrap();
        assert_status(&result, 200).unwrap();
    }

    #[test]
    fn test_redeploy_same_version() {
        let mut h = deployed("asubt-v6");
        h.dispatch(Request::new(AppFixtures::url("/assets/index.js")));
        h.deploy("asubt-v6").unwrap();

        let storage = h.container().storage().read();
        assert_eq!(storage.keys(), ["asubt-v6".to_string()]);
        assert_eq!(storage.get("asubt-v6").unwrap().len(), 3);
        assert_eq!(h.container().retired().len(), 1);
    }

    #[test]
    fn test_quota_exceeded_still_serves_network() {
        let shell_len = AppFixtures::shell_html().len();
        let storage = CacheStorage::with_quota(AppFixtures::ORIGIN, 2 * shell_len).shared();
        let mut h = OfflineHarness::with_storage(Arc::clone(&storage));
        h.deploy("asubt-v6").unwrap();
        assert_eq!(storage.read().usage(), 2 * shell_len);

        let asset = Request::new(AppFixtures::url("/assets/index.js"));
        let result = h.dispatch(asset.clone());
        assert_source(&result, FetchSource::Network).unwrap();
        assert_status(&result, 200).unwrap();
        assert!(storage.read().match_in("asubt-v6", &asset).is_none());

        h.go_offline();
        assert_source(&h.dispatch(asset), FetchSource::Offline).unwrap();
    }

    #[test]
    fn test_no_interception_before_deploy() {
        let h = OfflineHarness::new();
        assert_passthrough(&h.dispatch(Request::navigate(AppFixtures::url("/")))).unwrap();
        let (_, served) = h.navigate("/").unwrap();
        assert_eq!(served, Served::Bypassed);
    }

    #[test]
    fn test_waiting_version_takes_over_after_pages_close() {
        let mut h = deployed("asubt-v5");
        let page = h.container_mut().open_client(AppFixtures::url("/"));

        let mut config = OfflineConfig::for_origin(AppFixtures::ORIGIN).with_cache_name("asubt-v6");
        config.skip_waiting = false;
        h.container_mut().deploy(config).unwrap();
        assert_eq!(
            h.container().waiting().unwrap().state(),
            ServiceWorkerState::Installed
        );
        assert_eq!(h.container().active().unwrap().cache_name(), "asubt-v5");

        h.container_mut().close_client(page).unwrap();
        assert_eq!(h.container().active().unwrap().cache_name(), "asubt-v6");
        assert_eq!(
            h.container().storage().read().keys(),
            ["asubt-v6".to_string()]
        );
    }
}
