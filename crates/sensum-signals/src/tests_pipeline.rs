//! End-to-end pipeline tests: scripted sources through the supervisor
//! into estimators built by the factory.
