// Library module for testable functions

pub mod surveillance;

pub use surveillance::{
    Disease, DiseaseQuery, FetchError, FetchOutput, HttpTransport, SeasonCatalog,
    SurveillanceClient, Table, Transport,
};
