/// A named route table together with the request paths a benchmark resolves against it.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    table: RouteTable,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, table: RouteTable) -> Self {
        Self { name, group, table }
    }

    pub fn small(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Small, table)
    }

    pub fn normal(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Normal, table)
    }

    pub fn large(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Large, table)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    routes: &'static [(&'static str, &'static str)],
    requests: &'static [(&'static str, &'static str)],
}

impl RouteTable {
    pub const fn new(
        routes: &'static [(&'static str, &'static str)],
        requests: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { routes, requests }
    }

    /// `(method, pattern)` pairs to register
    pub fn routes(&self) -> &'static [(&'static str, &'static str)] {
        self.routes
    }

    /// `(method, path)` pairs to resolve, all expected to match
    pub fn requests(&self) -> &'static [(&'static str, &'static str)] {
        self.requests
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

pub static STATIC_ROUTES: RouteTable = RouteTable::new(
    &[
        ("GET", "/"),
        ("GET", "/about"),
        ("GET", "/contact"),
        ("GET", "/docs/getting-started"),
        ("GET", "/docs/guides/routing"),
        ("GET", "/docs/guides/middleware"),
        ("POST", "/v1/auth/login"),
        ("POST", "/v1/auth/logout"),
    ],
    &[("GET", "/"), ("GET", "/docs/guides/middleware"), ("POST", "/v1/auth/logout")],
);

pub static API_ROUTES: RouteTable = RouteTable::new(
    &[
        ("GET", "/api/users"),
        ("POST", "/api/users"),
        ("GET", "/api/users/:id|^[0-9]+$"),
        ("PUT", "/api/users/:id|^[0-9]+$"),
        ("DELETE", "/api/users/:id|^[0-9]+$"),
        ("GET", "/api/users/:id|^[0-9]+$/posts"),
        ("GET", "/api/users/:id|^[0-9]+$/posts/:post"),
        ("GET", "/api/users/:name|^[a-z]+$/profile"),
        ("GET", "/api/posts/:slug"),
        ("GET", "/api/posts/:slug/comments/:comment|^[0-9]+$"),
        ("GET", "/static/:filepath"),
    ],
    &[
        ("GET", "/api/users"),
        ("GET", "/api/users/42"),
        ("GET", "/api/users/42/posts/hello-world"),
        ("GET", "/api/users/bob/profile"),
        ("GET", "/api/posts/routing/comments/7"),
        ("GET", "/static/css/site.css"),
    ],
);
