pub mod controller {
    pub mod health {
        pub mod routes;
    }
}

pub mod infra {
    pub mod database;
    pub mod error;
    pub mod fcm;
}

pub mod routes;
pub mod state;
