use alloy_sol_types::sol;

// Generates the bindings for the `FaultDisputeGame` contract.
sol! {
    interface IFaultDisputeGame {
        function attack(uint256 _parentIndex, bytes32 _claim) external payable;
        function defend(uint256 _parentIndex, bytes32 _claim) external payable;
        function step(uint256 _claimIndex, bool _isAttack, bytes calldata _stateData, bytes calldata _proof) external;
        function resolve() external returns (uint8 status_);
        function status() external view returns (uint8 status_);
        function claimDataLen() external view returns (uint256 len_);
        function claimData(uint256 _index) external view returns (uint32 parentIndex, address counteredBy, address claimant, uint128 bond, bytes32 claim, uint128 position, uint128 clock);
        function absolutePrestate() external view returns (bytes32 absolutePrestate_);
        function genesisBlockNumber() external view returns (uint256 genesisBlockNumber_);
        function genesisOutputRoot() external view returns (bytes32 genesisOutputRoot_);
        function l2BlockNumber() external view returns (uint256 l2BlockNumber_);
        function splitDepth() external view returns (uint256 splitDepth_);
        function maxGameDepth() external view returns (uint256 maxGameDepth_);
        function gameDuration() external view returns (uint64 gameDuration_);
    }
}

// Generates the bindings for the `DisputeGameFactory` contract.
sol! {
    interface IDisputeGameFactory {
        function gameCount() external view returns (uint256 gameCount_);
        function gameAtIndex(uint256 _index) external view returns (uint8 gameType_, uint64 timestamp_, address proxy_);
    }
}
