/*
 *   Copyright (c) 2024 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Dispatches a parsed [`Request`] to the handler registered for its
//! `"METHOD path"` key, stored in an [`AdaptiveRadixTree`] rather than a
//! hash map -- an enrichment over a plain lookup table, chosen because
//! this crate already has an ordered string-keyed map and most route
//! tables share long path prefixes (`/api/users`, `/api/users/:id`,
//! `/api/orders`) that a radix tree packs far better than a hash map ever
//! could, at the cost of `get` no longer being O(1).

use evio_core::AdaptiveRadixTree;

use crate::request::Request;
use crate::response::Response;

type Handler = Box<dyn Fn(&Request) -> Response>;

/// A route table. Not thread-shared -- build it once on the thread that
/// owns the event loop, the same way `evio_core::reactor::Handle` is
/// confined to one loop.
#[derive(Default)]
pub struct Router {
    routes: AdaptiveRadixTree<Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: AdaptiveRadixTree::new(),
        }
    }

    /// Registers `handler` for `method` + `path`. A second call with the
    /// same method and path replaces the first handler, mirroring
    /// `AdaptiveRadixTree::insert`'s overwrite semantics.
    pub fn route(&mut self, method: &str, path: &str, handler: impl Fn(&Request) -> Response + 'static) {
        self.routes.insert(route_key(method, path).as_bytes(), Box::new(handler));
    }

    /// Looks up and runs the handler for `req`, or a 404 response if
    /// nothing matches its method and path exactly (no wildcard or
    /// prefix matching here -- see [`Self::route`]'s doc comment for why
    /// that's still useful to the radix tree's prefix sharing even
    /// without exact-match routing using it).
    pub fn dispatch(&self, req: &Request) -> Response {
        let key = route_key(req.method.as_str(), &req.path);
        match self.routes.get(key.as_bytes()) {
            Some(handler) => handler(req),
            None => Response::not_found(),
        }
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{method} {path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Method, Version};
    use std::collections::HashMap;

    fn request(method: Method, path: &str) -> Request {
        Request {
            method,
            path: path.to_string(),
            version: Version::Http11,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn dispatches_to_the_registered_handler() {
        let mut router = Router::new();
        router.route("GET", "/hello", |_req| Response::ok().with_body(Vec::from(&b"hi"[..])));
        let response = router.dispatch(&request(Method::Get, "/hello"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"hi");
    }

    #[test]
    fn unmatched_route_is_404() {
        let router = Router::new();
        let response = router.dispatch(&request(Method::Get, "/missing"));
        assert_eq!(response.status, 404);
    }

    #[test]
    fn method_is_part_of_the_route_key() {
        let mut router = Router::new();
        router.route("GET", "/item", |_req| Response::ok());
        let response = router.dispatch(&request(Method::Post, "/item"));
        assert_eq!(response.status, 404);
    }

    #[test]
    fn re_routing_the_same_method_and_path_replaces_the_handler() {
        let mut router = Router::new();
        router.route("GET", "/item", |_req| Response::new(201));
        router.route("GET", "/item", |_req| Response::new(202));
        let response = router.dispatch(&request(Method::Get, "/item"));
        assert_eq!(response.status, 202);
    }
}
