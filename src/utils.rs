pub(crate) mod rpc_client;
