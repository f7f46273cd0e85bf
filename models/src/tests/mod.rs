mod peer_info;
