#![cfg(test)]

mod fixture;
