//! A small annotated service used by the integration tests.

#[schema_namespace("http://example.com/store")]
mod store {
    #[path("/customers")]
    #[consumes("application/json")]
    #[produces("application/json", "application/xml")]
    struct CustomerResource;

    impl CustomerResource {
        #[get]
        pub fn list(
            &self,
            #[query("page")] page: i32,
            #[query("size")]
            #[default_value("20")]
            size: i32,
        ) -> Vec<Customer> {
            unimplemented!()
        }

        #[post]
        pub fn create(&self, customer: Customer) -> Customer {
            unimplemented!()
        }

        #[path("/{id:[0-9]+}")]
        pub fn customer(&self, #[path_param("id")] id: String) -> CustomerDetail {
            unimplemented!()
        }
    }

    struct CustomerDetail;

    impl CustomerDetail {
        #[get]
        pub fn fetch(&self, #[header("If-None-Match")] etag: String) -> Customer {
            unimplemented!()
        }

        #[delete]
        pub fn remove(&self) {
            unimplemented!()
        }
    }

    #[root_element]
    struct Customer;

    impl Customer {
        pub fn new() -> Self {
            unimplemented!()
        }

        #[xml_id]
        pub fn get_id(&self) -> String {
            unimplemented!()
        }

        pub fn set_id(&mut self, id: String) {
            unimplemented!()
        }

        pub fn get_name(&self) -> String {
            unimplemented!()
        }

        pub fn set_name(&mut self, name: String) {
            unimplemented!()
        }
    }
}
